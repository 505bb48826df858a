//! Expression tokenizer.

use compact_str::CompactString;

use super::parser::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    String(CompactString),
    Ident(CompactString),
    /// `$name`
    State(CompactString),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset into the expression source
    pub offset: usize,
}

/// Punctuators, longest first so greedy matching works.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "??", "++", "--", "+=", "-=", "*=", "/=",
    "+", "-", "*", "/", "%", "<", ">", "!", "=", "?", ":", ".", ",", ";", "(", ")", "[", "]",
    "{", "}",
];

#[inline]
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;

        if c.is_ascii_digit() || (c == '.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit)) {
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            let text = &source[start..pos];
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::new(format!("invalid number `{text}`"), start))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: start,
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let (value, end) = read_string(source, pos, c)?;
            tokens.push(Token {
                kind: TokenKind::String(value),
                offset: start,
            });
            pos = end;
            continue;
        }

        if c == '$' {
            pos += 1;
            let name_start = pos;
            while pos < bytes.len() && is_ident_char(bytes[pos] as char) {
                pos += 1;
            }
            if name_start == pos || !is_ident_start(bytes[name_start] as char) {
                return Err(ExprError::new("expected a state name after `$`", start));
            }
            tokens.push(Token {
                kind: TokenKind::State(CompactString::from(&source[name_start..pos])),
                offset: start,
            });
            continue;
        }

        if is_ident_start(c) {
            while pos < bytes.len() && is_ident_char(bytes[pos] as char) {
                pos += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(CompactString::from(&source[start..pos])),
                offset: start,
            });
            continue;
        }

        match PUNCTUATORS
            .iter()
            .find(|p| source[pos..].starts_with(**p))
        {
            Some(punct) => {
                pos += punct.len();
                tokens.push(Token {
                    kind: TokenKind::Punct(*punct),
                    offset: start,
                });
            }
            None => {
                let ch = source[pos..].chars().next().unwrap_or(c);
                return Err(ExprError::new(format!("unexpected character `{ch}`"), start));
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

/// Read a quoted string starting at `start` (which holds the quote).
/// Returns the unescaped value and the offset just past the closing quote.
fn read_string(source: &str, start: usize, quote: char) -> Result<(CompactString, usize), ExprError> {
    let mut value = CompactString::default();
    let mut chars = source[start + 1..].char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            c if c == quote => return Ok((value, start + 1 + i + 1)),
            c => value.push(c),
        }
    }

    Err(ExprError::new("unterminated string literal", start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_greedy_punctuators() {
        assert_eq!(
            kinds("$a === 1"),
            vec![
                TokenKind::State("a".into()),
                TokenKind::Punct("==="),
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("$n++")[1], TokenKind::Punct("++"));
    }

    #[test]
    fn test_strings_with_escapes() {
        assert_eq!(
            kinds(r#""say \"hi\"""#)[0],
            TokenKind::String("say \"hi\"".into())
        );
        assert_eq!(kinds("'it\\'s'")[0], TokenKind::String("it's".into()));
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("$").is_err());
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("a # b").is_err());
    }
}
