/// Splits an input string into a vector of arguments.
///
/// This tokenizer handles:
/// - Single quotes (`'...'`): Preserves literal contents, backslashes included.
/// - Double quotes (`"..."`): Preserves contents; only `\\`, `\$`, `\"` and an
///   escaped newline lose their backslash.
/// - Unquoted text: Split by whitespace, a backslash makes the next character literal.
///
/// Unterminated quotes and a trailing backslash are accepted as if the line
/// closed them; tokenizing never fails.
///
/// # Example
/// ```
/// use minishell::tokenize;
///
/// let args = tokenize("echo 'hello world'");
/// assert_eq!(args, vec!["echo", "hello world"]);
/// ```
pub fn tokenize(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut arg = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for c in input.trim().chars() {
        if escaped {
            if in_double && !matches!(c, '\\' | '$' | '"' | '\n') {
                arg.push('\\');
            }
            arg.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if in_single => arg.push(c),
            '\\' => escaped = true,
            c if c.is_whitespace() && !in_single && !in_double => {
                if !arg.is_empty() {
                    args.push(std::mem::take(&mut arg));
                }
            }
            c => arg.push(c),
        }
    }

    if escaped {
        arg.push('\\');
    }
    if !arg.is_empty() {
        args.push(arg);
    }
    args
}
