//! Inline content scanner.
//!
//! Scans the tokens found inside an element's `[...]` content or on an
//! inline-content line. At each position the token forms are tried in a
//! fixed order: text literal, `$variable`, `:property`, `name{attribute}`,
//! `!event`, and finally a ``` fence that pulls in the following raw lines.

use compact_str::CompactString;
use sprout_seed::expr::parse_expression;
use sprout_seed::{
    Attribute, AttributeValue, CompileError, ErrorCode, EventBinding, Expression, Node,
};

use crate::bindings::{Bindings, Unbound};
use crate::lines::Line;
use crate::text::{find_closing, ident_len, skip_string};

pub(crate) const FENCE: &str = "```";

/// Event name reserved for navigation.
pub const NAV_EVENT: &str = "nav";

/// Event bound by the `!action` shorthand.
pub const DEFAULT_EVENT: &str = "click";

/// Where the scanned content ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminator {
    /// Content opened with `[`; the matching `]` ends it
    Bracket,
    /// An inline-content line ends with the line itself
    EndOfLine,
}

/// Result of scanning one run of inline content.
#[derive(Debug)]
pub(crate) struct InlineScan<'a> {
    pub nodes: Vec<Node<'a>>,
    /// Index of the line the content ended on (later than the start when a
    /// fence was consumed)
    pub end_line: usize,
    /// Offset just past the content on `end_line`
    pub end_pos: usize,
}

pub(crate) struct InlineScanner<'l, 's> {
    lines: &'l [Line<'s>],
    line: usize,
    pos: usize,
    terminator: Terminator,
    /// Attributes and events are only legal when the content belongs to an element
    in_element: bool,
    bindings: Bindings<'l>,
    /// Where the content opened, for unclosed-content diagnostics
    open: (usize, usize),
}

impl<'l, 's> InlineScanner<'l, 's> {
    /// `pos` points just past the opening `[` for bracketed content, or at
    /// the first token of an inline-content line.
    pub fn new(
        lines: &'l [Line<'s>],
        line: usize,
        pos: usize,
        terminator: Terminator,
        in_element: bool,
        bindings: Bindings<'l>,
    ) -> Self {
        Self {
            lines,
            line,
            pos,
            terminator,
            in_element,
            bindings,
            open: (line, pos.saturating_sub(1)),
        }
    }

    pub fn scan<'a>(mut self) -> Result<InlineScan<'a>, CompileError> {
        let mut nodes = Vec::new();

        loop {
            let text = self.text();
            let bytes = text.as_bytes();
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos >= bytes.len() {
                return match self.terminator {
                    Terminator::EndOfLine => Ok(InlineScan {
                        nodes,
                        end_line: self.line,
                        end_pos: self.pos,
                    }),
                    Terminator::Bracket => {
                        let (line, pos) = self.open;
                        Err(self.error_at(line, pos, ErrorCode::UnclosedContent))
                    }
                };
            }

            let rest = &text[self.pos..];
            if rest.starts_with(FENCE) {
                self.fence(&mut nodes)?;
                continue;
            }

            match bytes[self.pos] {
                b']' => {
                    if self.terminator == Terminator::Bracket {
                        return Ok(InlineScan {
                            nodes,
                            end_line: self.line,
                            end_pos: self.pos + 1,
                        });
                    }
                    return Err(self
                        .error(ErrorCode::UnexpectedContent)
                        .with_detail("unexpected `]` outside of element content"));
                }
                b'"' => self.text_literal(&mut nodes)?,
                b'$' => self.variable(&mut nodes)?,
                b':' => self.property(&mut nodes)?,
                b'!' => self.event(&mut nodes)?,
                _ if attribute_name_len(rest) > 0 => self.attribute(&mut nodes)?,
                _ => {
                    let ch = rest.chars().next().unwrap_or(' ');
                    return Err(self
                        .error(ErrorCode::InvalidInlineToken)
                        .with_detail(format!("unexpected `{ch}` in inline content")));
                }
            }
        }
    }

    fn text(&self) -> &'s str {
        self.lines[self.line].text
    }

    fn error(&self, code: ErrorCode) -> CompileError {
        self.error_at(self.line, self.pos, code)
    }

    fn error_at(&self, line: usize, pos: usize, code: ErrorCode) -> CompileError {
        let line = &self.lines[line];
        CompileError::new(code, line.number, line.column(pos))
    }

    fn unbound(&self, offset: usize, unbound: Unbound) -> CompileError {
        self.error_at(self.line, offset + unbound.offset, unbound.code)
            .with_detail(unbound.detail)
    }

    /// Parse `source`, found at `offset` on the current line.
    fn expression(&self, source: &str, offset: usize) -> Result<Expression, CompileError> {
        let leading = source.len() - source.trim_start().len();
        let source = source.trim();
        let expression = parse_expression(source)
            .map(|expr| Expression::new(source, expr))
            .map_err(|err| {
                self.error_at(
                    self.line,
                    offset + leading + err.offset,
                    ErrorCode::InvalidExpression,
                )
                .with_detail(format!("`{source}`: {err}"))
            })?;
        match self.bindings.check(&expression) {
            Some(unbound) => Err(self.unbound(offset + leading, unbound)),
            None => Ok(expression),
        }
    }

    fn check_binding(&self, start: usize) -> Result<(), CompileError> {
        if self.in_element {
            Ok(())
        } else {
            Err(self.error_at(self.line, start, ErrorCode::ContentOutsideElement))
        }
    }

    /// `"text with @{live} and #{once} parts"`
    fn text_literal<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let start = self.pos;
        let mut buffer = CompactString::default();
        let mut i = start + 1;

        while let Some(c) = text[i..].chars().next() {
            match c {
                '\\' => {
                    i += 1;
                    if let Some(escaped) = text[i..].chars().next() {
                        buffer.push(escaped);
                        i += escaped.len_utf8();
                    }
                }
                '"' => {
                    flush_text(&mut buffer, nodes);
                    self.pos = i + 1;
                    return Ok(());
                }
                '@' | '#' if text[i + 1..].starts_with('{') => {
                    let open = i + 1;
                    let close = find_closing(text, open).ok_or_else(|| {
                        self.error_at(self.line, i, ErrorCode::UnterminatedInterpolation)
                    })?;
                    let expression = self.expression(&text[open + 1..close], open + 1)?;
                    flush_text(&mut buffer, nodes);
                    nodes.push(if c == '@' {
                        Node::ReactiveInterpolation(expression)
                    } else {
                        Node::StaticInterpolation(expression)
                    });
                    i = close + 1;
                }
                c => {
                    buffer.push(c);
                    i += c.len_utf8();
                }
            }
        }

        Err(self.error_at(self.line, start, ErrorCode::UnterminatedString))
    }

    /// `$name`
    fn variable<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let start = self.pos;
        let len = ident_len(&text[start + 1..]);
        if len == 0 {
            return Err(self
                .error(ErrorCode::InvalidInlineToken)
                .with_detail("expected a state name after `$`"));
        }
        let end = start + 1 + len;
        if !ends_reference(&text[end..]) {
            return Err(self
                .error_at(self.line, end, ErrorCode::InvalidInlineToken)
                .with_detail(format!(
                    "`${}` must be followed by whitespace, `]` or `\"`",
                    &text[start + 1..end]
                )));
        }
        let name = &text[start + 1..end];
        if let Some(unbound) = self.bindings.state(name) {
            return Err(self.unbound(start, unbound));
        }
        nodes.push(Node::Variable(CompactString::from(name)));
        self.pos = end;
        Ok(())
    }

    /// `:field`
    fn property<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let start = self.pos;
        let len = ident_len(&text[start + 1..]);
        if len == 0 {
            return Err(self
                .error(ErrorCode::InvalidInlineToken)
                .with_detail("expected a field name after `:`"));
        }
        let end = start + 1 + len;
        let field = &text[start + 1..end];
        if let Some(unbound) = self.bindings.item(field) {
            return Err(self.unbound(start, unbound));
        }
        nodes.push(Node::PropertyAccess(CompactString::from(field)));
        self.pos = end;
        Ok(())
    }

    /// `name{"static"}` or `name{expression}`
    fn attribute<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let start = self.pos;
        self.check_binding(start)?;

        let name_end = start + attribute_name_len(&text[start..]);
        let close = find_closing(text, name_end).ok_or_else(|| {
            self.error_at(self.line, name_end, ErrorCode::InvalidInlineToken)
                .with_detail("attribute value is missing its closing `}`")
        })?;

        let inner = &text[name_end + 1..close];
        let trimmed = inner.trim();
        let value = match static_value(trimmed) {
            Some(value) => AttributeValue::Static(value),
            None => AttributeValue::Dynamic(self.expression(inner, name_end + 1)?),
        };

        nodes.push(Node::Attribute(Attribute {
            name: CompactString::from(&text[start..name_end]),
            value,
        }));
        self.pos = close + 1;
        Ok(())
    }

    /// `!event(action)`, `!nav(path)` or the `!action` click shorthand
    fn event<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let start = self.pos;
        self.check_binding(start)?;

        let name_len = ident_len(&text[start + 1..]);
        let open = start + 1 + name_len;
        if name_len > 0 && text[open..].starts_with('(') {
            let close = find_closing(text, open).ok_or_else(|| {
                self.error_at(self.line, open, ErrorCode::InvalidInlineToken)
                    .with_detail("event action is missing its closing `)`")
            })?;
            let name = &text[start + 1..open];
            let inner = &text[open + 1..close];

            if name == NAV_EVENT {
                let path = strip_quotes(inner.trim());
                if path.is_empty() {
                    return Err(self
                        .error_at(self.line, open, ErrorCode::InvalidInlineToken)
                        .with_detail("navigation needs a path"));
                }
                nodes.push(Node::Nav(CompactString::from(path)));
            } else {
                nodes.push(Node::Event(EventBinding {
                    name: CompactString::from(name),
                    action: self.expression(inner, open + 1)?,
                }));
            }
            self.pos = close + 1;
            return Ok(());
        }

        let end = shorthand_end(text, start + 1);
        let action = &text[start + 1..end];
        if action.is_empty() {
            return Err(self
                .error(ErrorCode::InvalidInlineToken)
                .with_detail("expected an action after `!`"));
        }
        nodes.push(Node::Event(EventBinding {
            name: CompactString::const_new(DEFAULT_EVENT),
            action: self.expression(action, start + 1)?,
        }));
        self.pos = end;
        Ok(())
    }

    /// A ``` fence. Every following raw line up to the closing fence becomes
    /// a code line, with the block's common indentation removed. Scanning
    /// resumes after the closing fence on its line.
    fn fence<'a>(&mut self, nodes: &mut Vec<Node<'a>>) -> Result<(), CompileError> {
        let text = self.text();
        let (open_line, open_pos) = (self.line, self.pos);

        // An optional language hint may follow the opening fence
        let hint = text[open_pos + FENCE.len()..].trim();
        if !hint.is_empty() && !hint.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(self
                .error_at(self.line, open_pos + FENCE.len(), ErrorCode::UnexpectedContent)
                .with_detail("a fence must be the last token on its line"));
        }

        let body_start = open_line + 1;
        let close = self.lines[body_start.min(self.lines.len())..]
            .iter()
            .position(|line| line.text.starts_with(FENCE))
            .map(|p| body_start + p)
            .ok_or_else(|| self.error_at(open_line, open_pos, ErrorCode::UnterminatedFence))?;

        let body = &self.lines[body_start..close];
        let common = body
            .iter()
            .filter(|line| !line.text.is_empty())
            .map(|line| line.indent)
            .min()
            .unwrap_or(0);
        for line in body {
            let raw = line.raw.get(common.min(line.indent)..).unwrap_or("");
            nodes.push(Node::CodeLine(CompactString::from(raw.trim_end())));
        }

        self.line = close;
        self.pos = FENCE.len();
        Ok(())
    }
}

fn flush_text(buffer: &mut CompactString, nodes: &mut Vec<Node<'_>>) {
    if !buffer.is_empty() {
        nodes.push(Node::Text(std::mem::take(buffer)));
    }
}

/// A `$name` reference must end at whitespace, `]`, `"` or the end.
fn ends_reference(rest: &str) -> bool {
    match rest.as_bytes().first() {
        None => true,
        Some(b) => b.is_ascii_whitespace() || *b == b']' || *b == b'"',
    }
}

/// Length of an attribute name (`[A-Za-z][A-Za-z0-9_-]*`) directly followed
/// by `{`, or 0.
pub(crate) fn attribute_name_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_alphabetic() {
        return 0;
    }
    let len = bytes
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-'))
        .unwrap_or(bytes.len());
    if bytes.get(len) == Some(&b'{') {
        len
    } else {
        0
    }
}

/// A value quoted at both ends is static.
fn static_value(value: &str) -> Option<CompactString> {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let quote = bytes[0];
    if !(quote == b'"' || quote == b'\'') || bytes[bytes.len() - 1] != quote {
        return None;
    }
    // `"a" + "b"` is an expression, not a quoted value
    if skip_string(bytes, 0) != Some(bytes.len()) {
        return None;
    }
    let mut out = CompactString::default();
    let mut chars = value[1..value.len() - 1].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c => out.push(c),
        }
    }
    Some(out)
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// End of a shorthand action: whitespace or `]` at depth 0.
fn shorthand_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b'}' => depth = depth.saturating_sub(1),
            b']' if depth == 0 => return i,
            b']' => depth -= 1,
            b if b.is_ascii_whitespace() && depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    i
}
