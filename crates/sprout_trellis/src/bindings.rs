//! Names an expression may refer to at a given point of the markup.

use compact_str::CompactString;
use rustc_hash::FxHashSet;
use sprout_seed::expr::Expr;
use sprout_seed::{ErrorCode, Expression};

/// What the expressions of one block can see.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bindings<'n> {
    pub states: &'n FxHashSet<CompactString>,
    /// Inside a loop template, where `:field` reads the current item
    pub in_loop: bool,
}

/// A reference that does not resolve, located by a byte offset into the
/// expression source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Unbound {
    pub offset: usize,
    pub code: ErrorCode,
    pub detail: String,
}

impl<'n> Bindings<'n> {
    pub fn new(states: &'n FxHashSet<CompactString>) -> Self {
        Self {
            states,
            in_loop: false,
        }
    }

    pub fn in_loop(self) -> Self {
        Self {
            in_loop: true,
            ..self
        }
    }

    pub fn state(&self, name: &str) -> Option<Unbound> {
        if self.states.contains(name) {
            return None;
        }
        Some(Unbound {
            offset: 0,
            code: ErrorCode::UnknownState,
            detail: format!("state `${name}` is not declared"),
        })
    }

    pub fn item(&self, field: &str) -> Option<Unbound> {
        if self.in_loop {
            return None;
        }
        Some(Unbound {
            offset: 0,
            code: ErrorCode::ItemOutsideLoop,
            detail: format!("`:{field}` is only available inside a loop"),
        })
    }

    /// First reference in `expression` that does not resolve here.
    pub fn check(&self, expression: &Expression) -> Option<Unbound> {
        let mut states = Vec::new();
        expression.expr.collect_states(&mut states);
        if let Some(unbound) = states.into_iter().find_map(|name| {
            self.state(name)
                .map(|unbound| unbound.at(token_offset(&expression.source, '$', name)))
        }) {
            return Some(unbound);
        }

        let mut field = None;
        expression.expr.walk(&mut |expr| {
            if let Expr::Item(name) = expr {
                field.get_or_insert(name);
            }
        });
        let name = field?;
        self.item(name)
            .map(|unbound| unbound.at(token_offset(&expression.source, ':', name)))
    }
}

impl Unbound {
    fn at(self, offset: usize) -> Self {
        Self { offset, ..self }
    }
}

/// Offset of `{sigil}{name}` as a whole token in `source`, or 0.
fn token_offset(source: &str, sigil: char, name: &str) -> usize {
    let token = format!("{sigil}{name}");
    source
        .match_indices(&token)
        .find(|(at, _)| {
            !source[at + token.len()..]
                .starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        })
        .map_or(0, |(at, _)| at)
}
