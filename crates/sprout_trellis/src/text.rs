//! Quote and bracket aware scanning helpers.

/// Skip a quoted string starting at `start` (the quote). Returns the offset
/// just past the closing quote.
pub(crate) fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Find the byte offset of the delimiter closing the group opened at `open`
/// (which must hold `(`, `[` or `{`).
pub(crate) fn find_closing(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'\\' => {
                i += 2;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find `pattern` outside of strings and bracket groups.
pub(crate) fn find_top_level(text: &str, pattern: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if depth == 0 && text[i..].starts_with(pattern) => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split by `separator` at the top level. Each part keeps its byte offset.
pub(crate) fn split_top_level<'t>(text: &'t str, separator: &str) -> Vec<(usize, &'t str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(found) = find_top_level(&text[start..], separator) {
        parts.push((start, &text[start..start + found]));
        start += found + separator.len();
    }
    parts.push((start, &text[start..]));
    parts
}

/// Trim a part while keeping its offset pointing at the first kept byte.
pub(crate) fn trim_part((offset, part): (usize, &str)) -> (usize, &str) {
    let leading = part.len() - part.trim_start().len();
    (offset + leading, part.trim())
}

#[inline]
pub(crate) fn is_ident(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Length of the identifier at the start of `text`.
#[inline]
pub(crate) fn ident_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !(bytes[0].is_ascii_alphabetic() || bytes[0] == b'_') {
        return 0;
    }
    bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
        .unwrap_or(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_closing_skips_strings() {
        let text = r#"click(log(")"))rest"#;
        assert_eq!(find_closing(text, 5), Some(14));
        assert_eq!(find_closing("{a: {b: 1}}", 0), Some(10));
        assert_eq!(find_closing("(open", 0), None);
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_top_level("a, f(b, c), d", ","), Some(1));
        assert_eq!(find_top_level("f(a |> b) |> c", "|>"), Some(10));
        assert_eq!(find_top_level("'|>' + x", "|>"), None);
    }

    #[test]
    fn test_split_top_level_offsets() {
        let parts = split_top_level("$a > 1, f(1, 2) ,$b", ",");
        assert_eq!(parts.len(), 3);
        assert_eq!(trim_part(parts[1]), (8, "f(1, 2)"));
        assert_eq!(trim_part(parts[2]), (17, "$b"));
    }

    #[test]
    fn test_idents() {
        assert!(is_ident("count_2"));
        assert!(!is_ident("2count"));
        assert_eq!(ident_len("name{x}"), 4);
        assert_eq!(ident_len("-x"), 0);
    }
}
