//! Argument parser for LeetCode-style example inputs.
//!
//! `nums = [2,7,11,15], target = 9` becomes
//! `[("nums", "[2,7,11,15]"), ("target", "9")]`. Commas split assignments only
//! at bracket depth zero and outside quotes; JSON literal tokens are
//! translated to their Python spelling.

use crate::errors::ExampleFormatError;

fn closer_for(open: char) -> char {
    match open {
        '[' => ']',
        '{' => '}',
        _ => ')',
    }
}

/// Split `input` into top-level `name = value` assignments, in source order.
///
/// Segments without `=` are dropped. Mismatched brackets and unterminated
/// quotes are rejected.
pub fn parse_assignments(input: &str) -> Result<Vec<(String, String)>, ExampleFormatError> {
    let mut segments = Vec::new();
    let mut expected_closers: Vec<char> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;
    let mut start = 0;

    for (offset, c) in input.char_indices() {
        if let Some((q, _)) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some((c, offset)),
            '[' | '{' | '(' => expected_closers.push(closer_for(c)),
            ']' | '}' | ')' => {
                if expected_closers.pop() != Some(c) {
                    return Err(ExampleFormatError::UnbalancedBracket { bracket: c, offset });
                }
            }
            ',' if expected_closers.is_empty() => {
                segments.push(&input[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }

    if let Some((quote, offset)) = quote {
        return Err(ExampleFormatError::UnterminatedQuote { quote, offset });
    }
    if !expected_closers.is_empty() {
        return Err(ExampleFormatError::UnclosedBrackets {
            open: expected_closers.len(),
        });
    }
    segments.push(&input[start..]);

    Ok(segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), translate_literals(value.trim())))
        .collect())
}

/// Replace whole `null`/`true`/`false` tokens outside string literals with
/// `None`/`True`/`False`.
pub fn translate_literals(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        if c == '"' || c == '\'' {
            quote = Some(c);
            out.push(c);
        } else if c.is_alphabetic() || c == '_' {
            let mut word = String::from(c);
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    word.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            out.push_str(match word.as_str() {
                "null" => "None",
                "true" => "True",
                "false" => "False",
                other => other,
            });
        } else if c.is_ascii_digit() {
            // Keep digit runs intact so `1e5` or `0x1f` never expose a token.
            out.push(c);
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    out.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
