//! Utility functions for code generation.

/// Quote and escape a string as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    fn push_hex4(out: &mut String, value: u32) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        out.push_str("\\u");
        for shift in [12, 8, 4, 0] {
            out.push(HEX[((value >> shift) & 0xF) as usize] as char);
        }
    }

    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => push_hex4(&mut result, c as u32),
            c if (c as u32) < 0x20 => push_hex4(&mut result, c as u32),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Print a number the way JavaScript source would spell it.
pub fn js_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Check if a string is a valid JavaScript identifier
pub fn is_js_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Object key, quoted when it is not an identifier
pub fn js_key(s: &str) -> String {
    if is_js_identifier(s) {
        s.to_string()
    } else {
        js_string(s)
    }
}

/// Capitalize the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `todo-list` / `todo_list` / `todoList` -> `TodoList`, usable as a
/// function name.
pub fn to_pascal_case(s: &str) -> String {
    let mut out: String = s
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string() {
        assert_eq!(js_string("plain"), r#""plain""#);
        assert_eq!(js_string("say \"hi\"\n"), r#""say \"hi\"\n""#);
        assert_eq!(js_string("a\u{1}"), r#""a\u0001""#);
    }

    #[test]
    fn test_js_number() {
        assert_eq!(js_number(3.0), "3");
        assert_eq!(js_number(-0.5), "-0.5");
        assert_eq!(js_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_keys() {
        assert_eq!(js_key("title"), "title");
        assert_eq!(js_key("data-id"), r#""data-id""#);
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("todo-list"), "TodoList");
        assert_eq!(to_pascal_case("Counter"), "Counter");
        assert_eq!(to_pascal_case("my_app"), "MyApp");
        assert_eq!(to_pascal_case("404"), "_404");
    }
}
