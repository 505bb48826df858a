//! Element headers: `tag(.class)*(#id)?`.

use compact_str::CompactString;
use smallvec::SmallVec;

/// Tag used when a header omits it.
pub const DEFAULT_TAG: &str = "div";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub tag: CompactString,
    pub classes: SmallVec<[CompactString; 4]>,
    pub id: Option<CompactString>,
}

/// A header error with the byte offset it was found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeaderError {
    pub offset: usize,
    pub message: String,
}

/// Locate the bracket that opens inline content.
///
/// Brackets directly preceded by `-` belong to arbitrary-value utility
/// classes such as `w-[200px]` and open a nesting level instead. Only an
/// unescaped, non hyphen-prefixed `[` at depth 0 opens content.
pub fn find_content_open(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'[' => {
                let hyphenated = i > 0 && bytes[i - 1] == b'-';
                if depth == 0 && !hyphenated {
                    return Some(i);
                }
                depth += 1;
            }
            b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

pub(crate) fn parse_header(text: &str) -> Result<Header, HeaderError> {
    let bytes = text.as_bytes();
    let tag_len = bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-'))
        .unwrap_or(bytes.len());

    let tag = &text[..tag_len];
    if !tag.is_empty() && !bytes[0].is_ascii_alphabetic() {
        return Err(HeaderError {
            offset: 0,
            message: format!("tag `{tag}` must start with a letter"),
        });
    }

    let mut header = Header {
        tag: CompactString::from(if tag.is_empty() { DEFAULT_TAG } else { tag }),
        classes: SmallVec::new(),
        id: None,
    };

    let mut i = tag_len;
    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                if header.id.is_some() {
                    return Err(HeaderError {
                        offset: i,
                        message: "classes must come before the `#id`".to_string(),
                    });
                }
                let end = class_end(bytes, i + 1);
                if end == i + 1 {
                    return Err(HeaderError {
                        offset: i,
                        message: "empty class name".to_string(),
                    });
                }
                header.classes.push(CompactString::from(&text[i + 1..end]));
                i = end;
            }
            b'#' => {
                if header.id.is_some() {
                    return Err(HeaderError {
                        offset: i,
                        message: "an element can only have one `#id`".to_string(),
                    });
                }
                let start = i + 1;
                let end = bytes[start..]
                    .iter()
                    .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_'))
                    .map_or(bytes.len(), |p| start + p);
                if end == start {
                    return Err(HeaderError {
                        offset: i,
                        message: "empty id".to_string(),
                    });
                }
                header.id = Some(CompactString::from(&text[start..end]));
                i = end;
            }
            other => {
                let ch = text[i..].chars().next().unwrap_or(other as char);
                return Err(HeaderError {
                    offset: i,
                    message: format!("unexpected `{ch}` in element header"),
                });
            }
        }
    }

    Ok(header)
}

/// End of a class token: the next `.`, `#` or whitespace outside brackets.
fn class_end(bytes: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'.' | b'#' if depth == 0 => return i,
            b if b.is_ascii_whitespace() && depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    i
}
