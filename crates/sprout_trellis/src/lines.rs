//! Physical source lines.

/// One physical source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'s> {
    /// 1-indexed line number
    pub number: u32,
    /// Count of leading whitespace characters
    pub indent: usize,
    /// Content after the indentation, trailing whitespace removed
    pub text: &'s str,
    /// The untouched line (without its terminator)
    pub raw: &'s str,
}

impl<'s> Line<'s> {
    /// Blank lines and `//` comments carry no structure.
    #[inline]
    pub fn is_insignificant(&self) -> bool {
        self.text.is_empty() || self.text.starts_with("//")
    }

    /// 1-indexed column of a byte offset into `text`.
    #[inline]
    pub fn column(&self, offset: usize) -> u32 {
        (self.indent + offset + 1) as u32
    }
}

pub(crate) fn split_lines(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| {
            let trimmed = raw.trim_start_matches([' ', '\t']);
            Line {
                number: (i + 1) as u32,
                indent: raw.len() - trimmed.len(),
                text: trimmed.trim_end(),
                raw: raw.trim_end_matches('\r'),
            }
        })
        .collect()
}
