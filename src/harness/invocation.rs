//! Invocation synthesizer: turns submitted code plus parsed example arguments
//! into a runnable Python program whose last output line is the result.

/// Prefix of the output line printed when the call raises.
pub const FAULT_PREFIX: &str = "Error: ";

/// `"Two Sum"` -> `"two_sum"`, `"3Sum Closest"` -> `"3sum_closest"`.
pub fn entry_point_name(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    let mut pending_separator = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !name.is_empty() {
                name.push('_');
            }
            pending_separator = false;
            name.push(c);
        } else {
            pending_separator = true;
        }
    }
    name
}

/// `"two_sum"` -> `"twoSum"`.
pub fn camel_case_name(snake: &str) -> String {
    let mut parts = snake.split('_').filter(|p| !p.is_empty());
    let mut name = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

/// Names tried at run time, snake_case first.
pub fn candidate_names(title: &str) -> Vec<String> {
    let snake = entry_point_name(title);
    let camel = camel_case_name(&snake);
    let mut names = vec![snake];
    if !names.contains(&camel) {
        names.push(camel);
    }
    names.retain(|n| !n.is_empty());
    names
}

fn python_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Compose the program for one example.
///
/// The submitted code comes first, verbatim, followed by one statement per
/// assignment and a guarded call. Each candidate name is tried as a free
/// function and then as a method of `Solution`. The program prints exactly
/// one line: the result, or `Error: <Type>: <message>` if anything raised.
pub fn synthesize(code: &str, title: &str, assignments: &[(String, String)]) -> String {
    let names = candidate_names(title);
    let name_tuple = names
        .iter()
        .map(|n| python_str(n))
        .chain(std::iter::once(String::new()))
        .collect::<Vec<_>>()
        .join(", ");
    let args = assignments
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut program = String::new();
    program.push_str(code.trim_end());
    program.push_str("\n\n");
    for (name, value) in assignments {
        program.push_str(&format!("{} = {}\n", name, value));
    }
    program.push_str(&format!(
        r#"
def __codeteach_entry():
    for __name in ({names}):
        __fn = globals().get(__name)
        if callable(__fn):
            return __fn
        __cls = globals().get("Solution")
        if isinstance(__cls, type) and callable(getattr(__cls, __name, None)):
            return getattr(__cls(), __name)
    raise NameError("no function named " + " or ".join(({names})))

try:
    result = __codeteach_entry()({args})
    print(result)
except Exception as __e:
    print("{fault}" + type(__e).__name__ + ": " + str(__e))
"#,
        names = name_tuple,
        args = args,
        fault = FAULT_PREFIX,
    ));
    program
}
