//! Indentation-driven block parser.
//!
//! A markup line owns every following line that is indented strictly
//! deeper than itself. The parser walks those blocks recursively; only the
//! relative order of indentation matters, never its width, so sources that
//! differ only in their indentation unit produce equal trees.

use bumpalo::Bump;
use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};
use sprout_seed::expr::{parse_expression, Expr};
use sprout_seed::{
    BumpVec, CompileError, Component, Conditional, EffectAction, Element, ErrorCode, Expression,
    Loop, Node,
};

use crate::bindings::{Bindings, Unbound};
use crate::header::{find_content_open, parse_header};
use crate::inline::{attribute_name_len, InlineScan, InlineScanner, Terminator, FENCE};
use crate::lines::{split_lines, Line};
use crate::preamble::{is_declaration, parse_preamble_line, PreambleItem};
use crate::text::{ident_len, is_ident};

/// Line separating the preamble from the markup.
pub const SEPARATOR: &str = "---";

/// Parser options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Accept sources without a `---` separator by treating their leading
    /// declaration-shaped lines as the preamble.
    pub legacy_layout: bool,
}

/// Parser for one component source
pub struct Parser<'a, 's> {
    /// Arena allocator
    allocator: &'a Bump,
    options: ParserOptions,
    lines: Vec<Line<'s>>,
    /// Lines swallowed by a fence (its raw body and closing line)
    fenced: Vec<bool>,
    aliases: FxHashMap<CompactString, CompactString>,
    /// Names of every declared state, known once the preamble is read
    states: FxHashSet<CompactString>,
    component: Component<'a>,
}

impl<'a, 's> Parser<'a, 's> {
    /// Create a new parser
    pub fn new(allocator: &'a Bump, source: &'s str) -> Self {
        Self::with_options(allocator, source, ParserOptions::default())
    }

    /// Create a new parser with options
    pub fn with_options(allocator: &'a Bump, source: &'s str, options: ParserOptions) -> Self {
        let lines = split_lines(source);
        let fenced = fence_mask(&lines);
        Self {
            allocator,
            options,
            lines,
            fenced,
            aliases: FxHashMap::default(),
            states: FxHashSet::default(),
            component: Component::new(allocator),
        }
    }

    /// Parse the source into a component. The first diagnostic aborts the
    /// whole unit.
    pub fn parse(mut self) -> Result<Component<'a>, CompileError> {
        let markup_start = self.split_phases();

        for index in 0..markup_start {
            let line = self.lines[index];
            if line.is_insignificant() || line.text == SEPARATOR {
                continue;
            }
            self.declare(&line)?;
        }
        self.states = self.component.states.iter().map(|state| state.name.clone()).collect();
        self.check_fetch_targets()?;
        self.check_preamble()?;

        let nodes = self.parse_block(markup_start, self.lines.len(), false, false)?;
        self.component.nodes = nodes;
        Ok(self.component)
    }

    /// Index of the first markup line.
    fn split_phases(&self) -> usize {
        if let Some(separator) = self
            .lines
            .iter()
            .position(|line| line.indent == 0 && line.text == SEPARATOR)
        {
            return separator + 1;
        }
        if !self.options.legacy_layout {
            return 0;
        }
        self.lines
            .iter()
            .position(|line| !line.is_insignificant() && !is_declaration(line.text))
            .unwrap_or(self.lines.len())
    }

    fn declare(&mut self, line: &Line<'s>) -> Result<(), CompileError> {
        match parse_preamble_line(line)? {
            PreambleItem::State(state) => {
                if self.component.state(&state.name).is_some() {
                    return Err(CompileError::new(
                        ErrorCode::DuplicateState,
                        line.number,
                        line.column(1),
                    )
                    .with_detail(format!("state `${}` is declared more than once", state.name)));
                }
                self.component.states.push(state);
            }
            PreambleItem::Effect(effect) => self.component.effects.push(effect),
            PreambleItem::Alias { name, definition } => {
                if self.aliases.contains_key(&name) {
                    return Err(CompileError::new(ErrorCode::InvalidAlias, line.number, line.column(1))
                        .with_detail(format!("alias `%{name}` is defined more than once")));
                }
                self.aliases.insert(name, definition);
            }
        }
        Ok(())
    }

    /// Fetch pipelines must land in a plain state cell.
    fn check_fetch_targets(&self) -> Result<(), CompileError> {
        for effect in self.component.effects.iter() {
            let EffectAction::Fetch(pipeline) = &effect.action else {
                continue;
            };
            match self.component.state(&pipeline.target) {
                Some(state) if !state.computed => {}
                found => {
                    let detail = if found.is_some() {
                        format!("fetch target `${}` is a computed state", pipeline.target)
                    } else {
                        format!("fetch target `${}` is not declared", pipeline.target)
                    };
                    return Err(CompileError::new(ErrorCode::InvalidFetchPipeline, effect.line, 1)
                        .with_detail(detail));
                }
            }
        }
        Ok(())
    }

    /// Initializers, guards and actions may only read declared state, and
    /// never the loop item.
    fn check_preamble(&self) -> Result<(), CompileError> {
        let bindings = Bindings::new(&self.states);
        let states = self
            .component
            .states
            .iter()
            .map(|state| (state.line, &state.initializer));
        let effects = self.component.effects.iter().flat_map(|effect| {
            let action = match &effect.action {
                EffectAction::Expr(expression) => expression,
                EffectAction::Fetch(pipeline) => &pipeline.url,
            };
            effect
                .dependencies
                .iter()
                .chain(std::iter::once(action))
                .map(move |expression| (effect.line, expression))
        });

        for (number, expression) in states.chain(effects) {
            let Some(unbound) = bindings.check(expression) else {
                continue;
            };
            let Some(line) = self.lines.get((number as usize).saturating_sub(1)) else {
                return Err(CompileError::new(unbound.code, number, 1).with_detail(unbound.detail));
            };
            let start = line.text.find(expression.source.as_str()).unwrap_or(0);
            let column = line.column(start + unbound.offset);
            return Err(CompileError::new(unbound.code, line.number, column).with_detail(unbound.detail));
        }
        Ok(())
    }

    fn bindings(&self, in_loop: bool) -> Bindings<'_> {
        Bindings {
            states: &self.states,
            in_loop,
        }
    }

    fn unbound(&self, index: usize, offset: usize, unbound: Unbound) -> CompileError {
        self.error(index, offset + unbound.offset, unbound.code)
            .with_detail(unbound.detail)
    }

    fn skip(&self, index: usize) -> bool {
        self.fenced[index] || self.lines[index].is_insignificant()
    }

    /// End of the block owned by the line at `owner`, searching from `from`.
    fn block_end(&self, owner: usize, from: usize, limit: usize) -> usize {
        let indent = self.lines[owner].indent;
        (from..limit)
            .find(|&i| !self.skip(i) && self.lines[i].indent <= indent)
            .unwrap_or(limit)
    }

    fn first_child(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).find(|&i| !self.skip(i))
    }

    fn error(&self, index: usize, offset: usize, code: ErrorCode) -> CompileError {
        let line = &self.lines[index];
        CompileError::new(code, line.number, line.column(offset))
    }

    fn expression(
        &self,
        index: usize,
        source: &str,
        offset: usize,
        in_loop: bool,
    ) -> Result<Expression, CompileError> {
        let expression = parse_expression(source)
            .map(|expr| Expression::new(source, expr))
            .map_err(|err| {
                self.error(index, offset + err.offset, ErrorCode::InvalidExpression)
                    .with_detail(format!("`{source}`: {err}"))
            })?;
        match self.bindings(in_loop).check(&expression) {
            Some(unbound) => Err(self.unbound(index, offset, unbound)),
            None => Ok(expression),
        }
    }

    /// Parse the lines in `start..end` as sibling markup. `in_loop` is set
    /// for everything below a loop, where `:field` reads the current item.
    fn parse_block(
        &mut self,
        start: usize,
        end: usize,
        in_element: bool,
        in_loop: bool,
    ) -> Result<BumpVec<'a, Node<'a>>, CompileError> {
        let mut nodes = BumpVec::new_in(self.allocator);
        // Conditional that a following `? else` may attach to: (node index, indent)
        let mut open_conditional: Option<(usize, usize)> = None;
        let mut index = start;

        while index < end {
            if self.skip(index) {
                index += 1;
                continue;
            }
            let line = self.lines[index];
            let text = line.text;

            if is_else(text) {
                let next = self.block_end(index, index + 1, end);
                let target = match open_conditional.take() {
                    Some((at, indent)) if indent == line.indent => at,
                    _ => return Err(self.error(index, 0, ErrorCode::DanglingElse)),
                };
                let branch = self.parse_block(index + 1, next, false, in_loop)?;
                if let Some(Node::Conditional(conditional)) = nodes.get_mut(target) {
                    conditional.false_branch = branch;
                }
                index = next;
                continue;
            }
            open_conditional = None;

            if let Some(condition) = text.strip_prefix('?') {
                let next = self.block_end(index, index + 1, end);
                let offset = text.len() - condition.trim_start().len();
                let condition = self.expression(index, condition.trim(), offset, in_loop)?;
                let true_branch = self.parse_block(index + 1, next, false, in_loop)?;
                nodes.push(Node::Conditional(Conditional {
                    condition,
                    true_branch,
                    false_branch: BumpVec::new_in(self.allocator),
                }));
                open_conditional = Some((nodes.len() - 1, line.indent));
                index = next;
                continue;
            }

            if let Some(name) = text.strip_prefix("::") {
                let next = self.block_end(index, index + 1, end);
                if !is_component_name(name) {
                    return Err(self
                        .error(index, 2, ErrorCode::InvalidComponentName)
                        .with_detail(format!("`{name}` is not a capitalized identifier")));
                }
                if let Some(child) = self.first_child(index + 1, next) {
                    return Err(self
                        .error(child, 0, ErrorCode::UnexpectedChildren)
                        .with_detail(format!("component `{name}` cannot have children")));
                }
                self.component.register_import(name);
                nodes.push(Node::Component(CompactString::from(name)));
                index = next;
                continue;
            }

            if let Some(name) = text.strip_prefix('$').filter(|name| is_ident(name)) {
                if let Some(unbound) = self.bindings(in_loop).state(name) {
                    return Err(self.unbound(index, 0, unbound));
                }
                let next = self.block_end(index, index + 1, end);
                if self.first_child(index + 1, next).is_some() {
                    let template = self.parse_block(index + 1, next, false, true)?;
                    nodes.push(Node::Loop(Loop {
                        array: Expression::new(text, Expr::State(name.into())),
                        template,
                    }));
                } else {
                    nodes.push(Node::Variable(CompactString::from(name)));
                }
                index = next;
                continue;
            }

            if is_stray_declaration(text) {
                return Err(self.error(index, 0, ErrorCode::UnexpectedContent).with_detail(
                    "declarations must come before the `---` separator",
                ));
            }

            if is_content_line(text) {
                let scan = InlineScanner::new(
                    &self.lines,
                    index,
                    0,
                    Terminator::EndOfLine,
                    in_element,
                    self.bindings(in_loop),
                )
                .scan()?;
                let next = self.block_end(index, scan.end_line + 1, end);
                if let Some(child) = self.first_child(scan.end_line + 1, next) {
                    return Err(self.error(child, 0, ErrorCode::UnexpectedChildren));
                }
                nodes.extend(scan.nodes);
                index = next;
                continue;
            }

            let (element, next) = self.parse_element(index, end, in_loop)?;
            nodes.push(Node::Element(element));
            index = next;
        }

        Ok(nodes)
    }

    /// An element line (possibly an alias use), its inline content and its
    /// children. Returns the element and the index after its block.
    fn parse_element(
        &mut self,
        index: usize,
        end: usize,
        in_loop: bool,
    ) -> Result<(Element<'a>, usize), CompileError> {
        let line = self.lines[index];
        let text = line.text;
        let open = find_content_open(text);
        let header_text = text[..open.unwrap_or(text.len())].trim_end();

        let header_text = match header_text.strip_prefix('%') {
            Some(name) => match self.aliases.get(name) {
                Some(definition) => definition.clone(),
                None => {
                    return Err(self
                        .error(index, 0, ErrorCode::UnknownAlias)
                        .with_detail(format!("unknown alias `%{name}`")))
                }
            },
            None => CompactString::from(header_text),
        };
        let header = parse_header(&header_text).map_err(|err| {
            let offset = if text.starts_with('%') { 0 } else { err.offset };
            self.error(index, offset, ErrorCode::InvalidElementHeader)
                .with_detail(err.message)
        })?;

        let mut element = Element::new(self.allocator, header.tag, line.number);
        element.classes = header.classes;
        element.id = header.id;

        let mut inline = Vec::new();
        let mut last_line = index;
        if let Some(open) = open {
            let InlineScan {
                nodes,
                end_line,
                end_pos,
            } = InlineScanner::new(
                &self.lines,
                index,
                open + 1,
                Terminator::Bracket,
                true,
                self.bindings(in_loop),
            )
            .scan()?;
            let trailing = self.lines[end_line].text[end_pos..].trim_start();
            if !trailing.is_empty() {
                let offset = self.lines[end_line].text.len() - trailing.len();
                return Err(self
                    .error(end_line, offset, ErrorCode::UnexpectedContent)
                    .with_detail(format!("unexpected `{trailing}` after element content")));
            }
            inline = nodes;
            last_line = end_line;
        }

        let next = self.block_end(index, last_line + 1, end);
        let children = self.parse_block(last_line + 1, next, true, in_loop)?;

        for node in inline.into_iter().chain(children) {
            match node {
                Node::Attribute(attribute) => element.attributes.push(attribute),
                other => element.children.push(other),
            }
        }

        Ok((element, next))
    }
}

fn is_else(text: &str) -> bool {
    text.strip_prefix('?').is_some_and(|rest| rest.trim() == "else")
}

/// A declaration below the separator. `$item :name` is inline content, not
/// a state.
fn is_stray_declaration(text: &str) -> bool {
    match text.strip_prefix('$') {
        Some(rest) => {
            let len = ident_len(rest);
            let after = &rest[len..];
            let value = after.trim_start().strip_prefix(':');
            let field = after.starts_with(char::is_whitespace) && value.is_some_and(|v| ident_len(v) > 0);
            len > 0 && value.is_some() && !field
        }
        None => is_declaration(text),
    }
}

fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) && is_ident(name)
}

/// Lines whose tokens attach to the enclosing block instead of opening an element.
fn is_content_line(text: &str) -> bool {
    match text.as_bytes().first() {
        Some(b'"' | b'!' | b'$') => true,
        Some(b':') => !text.starts_with("::"),
        _ => attribute_name_len(text) > 0,
    }
}

/// Mark the lines consumed by fences: every raw body line and the closing
/// fence line. They take no part in block structure.
fn fence_mask(lines: &[Line<'_>]) -> Vec<bool> {
    let mut mask = vec![false; lines.len()];
    let mut in_fence = false;
    for (i, line) in lines.iter().enumerate() {
        if in_fence {
            mask[i] = true;
            if let Some(rest) = line.text.strip_prefix(FENCE) {
                in_fence = count_fences(rest) % 2 == 1;
            }
        } else {
            in_fence = count_fences(line.text) % 2 == 1;
        }
    }
    mask
}

/// Count fences outside of double-quoted text.
fn count_fences(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'"' => in_string = !in_string,
            b'`' if !in_string && text[i..].starts_with(FENCE) => {
                count += 1;
                i += FENCE.len();
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    count
}
