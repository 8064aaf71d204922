//! Result comparator.
//!
//! Equality is decided by the interpreter itself (`ast.literal_eval` on both
//! sides, then `==`) so collection and numeric semantics match Python. If that
//! evaluation cannot produce a verdict, the trimmed texts are compared.

use tracing::debug;

use super::interpreter::Interpreter;
use super::parser::translate_literals;

const INCOMPARABLE: &str = "__codeteach_incomparable__";

/// The harness convention: the last non-empty output line is the result.
pub fn candidate_line(output: &str) -> String {
    output
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Trim the expected literal. A quoted literal loses one pair of surrounding
/// quotes and is otherwise kept verbatim; anything else gets JSON literal
/// tokens translated.
pub fn normalize_expected(expected: &str) -> String {
    let trimmed = expected.trim();
    let unquoted = ['"', '\'']
        .iter()
        .filter(|_| trimmed.len() >= 2)
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        });
    match unquoted {
        Some(inner) => inner.to_string(),
        None => translate_literals(trimmed),
    }
}

fn python_literal(text: &str) -> String {
    // A JSON string is also a valid Python string literal.
    serde_json::to_string(text).unwrap_or_else(|_| "''".to_string())
}

fn equality_program(actual: &str, expected: &str) -> String {
    format!(
        "import ast\n\
         try:\n    \
             print(ast.literal_eval({}) == ast.literal_eval({}))\n\
         except Exception:\n    \
             print({:?})\n",
        python_literal(actual),
        python_literal(expected),
        INCOMPARABLE
    )
}

/// Ask the interpreter whether the two literals are equal. `None` when it
/// could not tell.
async fn structural_equality(
    interpreter: &dyn Interpreter,
    actual: &str,
    expected: &str,
) -> Option<bool> {
    let execution = interpreter
        .execute(&equality_program(actual, expected))
        .await
        .ok()?;
    match candidate_line(&execution.stdout).as_str() {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

/// Compare captured `output` against an example's `expected` literal.
pub async fn compare(interpreter: &dyn Interpreter, output: &str, expected: &str) -> bool {
    let actual = candidate_line(output);
    let expected = normalize_expected(expected);

    match structural_equality(interpreter, &actual, &expected).await {
        Some(verdict) => verdict,
        None => {
            let verdict = actual == expected;
            debug!(%actual, %expected, verdict, "fell back to string comparison");
            verdict
        }
    }
}
