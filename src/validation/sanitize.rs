//! Text sanitization.

/// Characters with formatting meaning in chat markdown.
const MARKUP: &[char] = &['`', '*', '_', '~', '|'];

fn is_markup(c: char) -> bool {
    MARKUP.contains(&c)
}

/// Normalise free text for safe echoing.
///
/// Steps: drop control characters that are not whitespace, collapse each
/// whitespace run to a single space, trim, then backslash-escape markup
/// characters. An already escaped character (or escaped backslash) is copied
/// as is, which makes the function idempotent.
pub fn sanitize(input: &str) -> String {
    let mut collapsed = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }
        if pending_space && !collapsed.is_empty() {
            collapsed.push(' ');
        }
        pending_space = false;
        collapsed.push(c);
    }

    let mut out = String::with_capacity(collapsed.len() + 8);
    let mut chars = collapsed.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push('\\');
                if let Some(&next) = chars.peek() {
                    if next == '\\' || is_markup(next) {
                        out.push(next);
                        chars.next();
                    }
                }
            }
            c if is_markup(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// First `max_chars` characters of `input`, for log lines and audit records.
pub fn excerpt(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}

/// Truncate to at most `max_chars` characters without an ellipsis.
pub fn truncate(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
