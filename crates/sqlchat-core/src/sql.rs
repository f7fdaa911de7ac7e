//! Lexical checks on generated SQL text.

/// Byte offset of the first `;` that separates two statements.
///
/// Semicolons inside quoted strings, quoted identifiers, dollar-quoted
/// bodies and comments do not count. Trailing semicolons followed only by
/// whitespace or comments are terminators, not separators.
pub fn statement_separator(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_quoted(bytes, i),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = memchr_from(bytes, i, b'\n').map_or(bytes.len(), |end| end + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |end| i + 2 + end + 2);
            }
            b'$' => i = skip_dollar_quoted(sql, i),
            b';' => {
                if has_code_after(sql, i + 1) {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Whether `sql` holds at most one statement.
pub fn is_single_statement(sql: &str) -> bool {
    statement_separator(sql).is_none()
}

fn memchr_from(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|pos| from + pos)
}

/// Skips a `'...'` or `"..."` run; a doubled quote is an escaped quote.
fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Skips `$tag$ ... $tag$`. A `$` that does not open a tag (e.g. `$1`) is
/// stepped over.
fn skip_dollar_quoted(sql: &str, start: usize) -> usize {
    let rest = &sql[start + 1..];
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let tag = &rest[..tag_len];

    if !rest[tag_len..].starts_with('$') || tag.starts_with(|c: char| c.is_ascii_digit()) {
        return start + 1;
    }

    let delimiter = format!("${tag}$");
    let body_start = start + delimiter.len();
    sql[body_start..]
        .find(&delimiter)
        .map_or(sql.len(), |end| body_start + end + delimiter.len())
}

fn has_code_after(sql: &str, from: usize) -> bool {
    let mut rest = &sql[from..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ';');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            return !rest.is_empty();
        }
    }
}
