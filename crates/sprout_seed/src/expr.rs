//! Expression syntax tree.
//!
//! State initializers, effect actions, conditions, dynamic attributes and
//! interpolations all share one small JavaScript-like expression language.
//! `$name` reads a state cell, `:name` reads a field of the current loop
//! item, and bare identifiers name builtins.

mod lexer;
mod parser;

use compact_str::CompactString;

pub use parser::{parse_expression, ExprError};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    String(CompactString),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    Object(Vec<(CompactString, Expr)>),
    /// `$name`
    State(CompactString),
    /// `:name`
    Item(CompactString),
    Ident(CompactString),
    Member {
        object: Box<Expr>,
        property: CompactString,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Sequence(Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
            Self::Plus => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::StrictEq => "===",
            Self::StrictNe => "!==",
            Self::And => "&&",
            Self::Or => "||",
            Self::Coalesce => "??",
        }
    }

    /// Binding power, higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Coalesce => 1,
            Self::Or => 2,
            Self::And => 3,
            Self::Eq | Self::Ne | Self::StrictEq | Self::StrictNe => 4,
            Self::Lt | Self::Le | Self::Gt | Self::Ge => 5,
            Self::Add | Self::Sub => 6,
            Self::Mul | Self::Div | Self::Rem => 7,
        }
    }

    pub(crate) fn from_punct(punct: &str) -> Option<Self> {
        Some(match punct {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNe,
            "&&" => Self::And,
            "||" => Self::Or,
            "??" => Self::Coalesce,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub fn binary(&self) -> Option<BinaryOp> {
        match self {
            Self::Assign => None,
            Self::Add => Some(BinaryOp::Add),
            Self::Sub => Some(BinaryOp::Sub),
            Self::Mul => Some(BinaryOp::Mul),
            Self::Div => Some(BinaryOp::Div),
        }
    }

    pub(crate) fn from_punct(punct: &str) -> Option<Self> {
        Some(match punct {
            "=" => Self::Assign,
            "+=" => Self::Add,
            "-=" => Self::Sub,
            "*=" => Self::Mul,
            "/=" => Self::Div,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increment => "++",
            Self::Decrement => "--",
        }
    }
}

/// One step of a member path rooted at a state cell.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment<'e> {
    Field(&'e str),
    Index(&'e Expr),
}

impl Expr {
    /// The state name if this is a bare `$name` read.
    pub fn as_state(&self) -> Option<&str> {
        match self {
            Self::State(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this expression can be written to.
    pub fn is_assignable(&self) -> bool {
        self.state_path().is_some()
    }

    /// Split a member chain like `$user.address.city` into its root state and
    /// the path below it.
    pub fn state_path(&self) -> Option<(&str, Vec<PathSegment<'_>>)> {
        match self {
            Self::State(name) => Some((name.as_str(), Vec::new())),
            Self::Member { object, property } => {
                let (root, mut path) = object.state_path()?;
                path.push(PathSegment::Field(property));
                Some((root, path))
            }
            Self::Index { object, index } => {
                let (root, mut path) = object.state_path()?;
                path.push(PathSegment::Index(index));
                Some((root, path))
            }
            _ => None,
        }
    }

    /// Collect every `$state` this expression reads or writes, in order of
    /// first appearance.
    pub fn collect_states<'e>(&'e self, out: &mut Vec<&'e str>) {
        self.walk(&mut |expr| {
            if let Expr::State(name) = expr {
                if !out.contains(&name.as_str()) {
                    out.push(name.as_str());
                }
            }
        });
    }

    /// Whether the expression reads the current loop item.
    pub fn uses_item(&self) -> bool {
        let mut found = false;
        self.walk(&mut |expr| found |= matches!(expr, Expr::Item(_)));
        found
    }

    /// Pre-order traversal.
    pub fn walk<'e>(&'e self, f: &mut dyn FnMut(&'e Expr)) {
        f(self);
        match self {
            Self::Number(_)
            | Self::String(_)
            | Self::Bool(_)
            | Self::Null
            | Self::State(_)
            | Self::Item(_)
            | Self::Ident(_) => {}
            Self::Array(items) | Self::Sequence(items) => {
                for item in items {
                    item.walk(f);
                }
            }
            Self::Object(entries) => {
                for (_, value) in entries {
                    value.walk(f);
                }
            }
            Self::Member { object, .. } => object.walk(f),
            Self::Index { object, index } => {
                object.walk(f);
                index.walk(f);
            }
            Self::Call { callee, args } => {
                callee.walk(f);
                for arg in args {
                    arg.walk(f);
                }
            }
            Self::Unary { operand, .. } => operand.walk(f),
            Self::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Self::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.walk(f);
                consequent.walk(f);
                alternate.walk(f);
            }
            Self::Assign { target, value, .. } => {
                target.walk(f);
                value.walk(f);
            }
            Self::Update { target, .. } => target.walk(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_path() {
        let expr = parse_expression("$user.address[0].city").unwrap();
        let (root, path) = expr.state_path().unwrap();
        assert_eq!(root, "user");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], PathSegment::Field("address"));
        assert_eq!(path[2], PathSegment::Field("city"));
    }

    #[test]
    fn test_collect_states_dedup() {
        let expr = parse_expression("$a + $b * $a").unwrap();
        let mut states = Vec::new();
        expr.collect_states(&mut states);
        assert_eq!(states, vec!["a", "b"]);
    }

    #[test]
    fn test_uses_item() {
        assert!(parse_expression(":done ? 1 : 0").unwrap().uses_item());
        assert!(!parse_expression("$done").unwrap().uses_item());
    }
}
