//! Renders an argument vector as a single command line for a target shell.
//!
//! Each argument is quoted on its own and the results are joined with single
//! spaces, so the target shell's own word splitting yields the original
//! vector back.

fn is_posix_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '_' | '/' | '.' | '-' | ':' | '@' | '%' | '=' | '+' | ',')
}

fn needs_windows_quotes(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '"' | '&' | '\'' | '`' | '^' | '|' | '<' | '>')
}

/// Quotes one argument for `sh`/`bash`.
pub fn quote_posix(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.chars().all(is_posix_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

/// Quotes one argument for `cmd.exe` style command lines.
pub fn quote_windows(arg: &str) -> String {
    if arg.is_empty() {
        return r#""""#.to_string();
    }
    if !arg.chars().any(needs_windows_quotes) {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', r#""""#))
}

/// Quotes one argument for PowerShell. Single-quoted strings are verbatim
/// there apart from `'`, which is doubled.
pub fn quote_powershell(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if arg.chars().all(is_posix_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "''"))
}

pub fn join_posix<S: AsRef<str>>(args: &[S]) -> String {
    join_with(args, quote_posix)
}

pub fn join_windows<S: AsRef<str>>(args: &[S]) -> String {
    join_with(args, quote_windows)
}

pub fn join_powershell<S: AsRef<str>>(args: &[S]) -> String {
    join_with(args, quote_powershell)
}

fn join_with<S: AsRef<str>>(args: &[S], quote: fn(&str) -> String) -> String {
    args.iter()
        .map(|arg| quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Caret-escapes cmd operators that sit outside double quotes, counting
/// every `"` as a toggle the way cmd.exe does while it scans a line.
///
/// Text that one cmd parse sees as quoted passes through untouched, so a
/// payload whose inner quotes invert the quoting for this layer still
/// reaches the next layer intact.
pub fn escape_cmd_operators(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '"' => quoted = !quoted,
            '&' | '|' | '<' | '>' | '^' if !quoted => escaped.push('^'),
            _ => {}
        }
        escaped.push(ch);
    }
    escaped
}

/// Escapes text for the inside of an AppleScript string literal.
pub fn escape_applescript(text: &str) -> String {
    text.replace('\\', r"\\").replace('"', "\\\"")
}
