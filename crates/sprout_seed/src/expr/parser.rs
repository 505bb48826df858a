//! Precedence-climbing expression parser.

use compact_str::CompactString;

use super::lexer::{tokenize, Token, TokenKind};
use super::{AssignOp, BinaryOp, Expr, UnaryOp, UpdateOp};

/// Expression syntax error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (at offset {offset})")]
pub struct ExprError {
    pub message: String,
    /// Byte offset into the expression source
    pub offset: usize,
}

impl ExprError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parse a complete expression (optionally a `;` separated sequence).
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    if matches!(tokens[0].kind, TokenKind::Eof) {
        return Err(ExprError::new("expected an expression", 0));
    }
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.parse_sequence()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        other => Err(ExprError::new(
            format!("unexpected {}", describe(other)),
            parser.offset(),
        )),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number `{n}`"),
        TokenKind::String(_) => "string".to_string(),
        TokenKind::Ident(name) => format!("identifier `{name}`"),
        TokenKind::State(name) => format!("state `${name}`"),
        TokenKind::Punct(p) => format!("`{p}`"),
        TokenKind::Eof => "end of expression".to_string(),
    }
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos].offset
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.pos].kind.clone();
        if !matches!(kind, TokenKind::Eof) {
            self.pos += 1;
        }
        kind
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == punct)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(ExprError::new(
                format!("expected `{punct}`, found {}", describe(self.peek())),
                self.offset(),
            ))
        }
    }

    fn parse_sequence(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_assignment()?;
        if !self.is_punct(";") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(";") {
            // Trailing semicolon
            if matches!(self.peek(), TokenKind::Eof) {
                break;
            }
            items.push(self.parse_assignment()?);
        }
        Ok(Expr::Sequence(items))
    }

    fn parse_assignment(&mut self) -> Result<Expr, ExprError> {
        let start = self.offset();
        let left = self.parse_conditional()?;
        let op = match self.peek() {
            TokenKind::Punct(p) => AssignOp::from_punct(p),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(left);
        };
        if !left.is_assignable() {
            return Err(ExprError::new(
                "only state and paths below state can be assigned",
                start,
            ));
        }
        self.pos += 1;
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.parse_binary(1)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(":")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Punct(p) => BinaryOp::from_punct(p),
                _ => None,
            };
            let Some(op) = op else { break };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let start = self.offset();
        let unary = match self.peek() {
            TokenKind::Punct("!") => Some(UnaryOp::Not),
            TokenKind::Punct("-") => Some(UnaryOp::Neg),
            TokenKind::Punct("+") => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = unary {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let update = match self.peek() {
            TokenKind::Punct("++") => Some(UpdateOp::Increment),
            TokenKind::Punct("--") => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.pos += 1;
            let target = self.parse_unary()?;
            if !target.is_assignable() {
                return Err(ExprError::new(
                    format!("`{}` needs a state operand", op.as_str()),
                    start,
                ));
            }
            return Ok(Expr::Update {
                op,
                prefix: true,
                target: Box::new(target),
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let start = self.offset();
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(".") {
                match self.advance() {
                    TokenKind::Ident(name) => {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property: name,
                        };
                    }
                    other => {
                        return Err(ExprError::new(
                            format!("expected a property name, found {}", describe(&other)),
                            self.offset(),
                        ));
                    }
                }
            } else if self.eat("[") {
                let index = self.parse_assignment()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat("(") {
                let args = self.parse_list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else if self.is_punct("++") || self.is_punct("--") {
                let op = if self.is_punct("++") {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                if !expr.is_assignable() {
                    return Err(ExprError::new(
                        format!("`{}` needs a state operand", op.as_str()),
                        start,
                    ));
                }
                self.pos += 1;
                return Ok(Expr::Update {
                    op,
                    prefix: false,
                    target: Box::new(expr),
                });
            } else {
                return Ok(expr);
            }
        }
    }

    /// Parse comma separated expressions up to (and including) `close`.
    fn parse_list(&mut self, close: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_assignment()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
            // Trailing comma
            if self.eat(close) {
                return Ok(items);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let offset = self.offset();
        match self.advance() {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::String(s) => Ok(Expr::String(s)),
            TokenKind::State(name) => Ok(Expr::State(name)),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" | "undefined" => Expr::Null,
                _ => Expr::Ident(name),
            }),
            TokenKind::Punct(":") => match self.advance() {
                TokenKind::Ident(name) => Ok(Expr::Item(name)),
                other => Err(ExprError::new(
                    format!("expected an item field after `:`, found {}", describe(&other)),
                    offset,
                )),
            },
            TokenKind::Punct("(") => {
                let inner = self.parse_sequence()?;
                self.expect(")")?;
                Ok(inner)
            }
            TokenKind::Punct("[") => Ok(Expr::Array(self.parse_list("]")?)),
            TokenKind::Punct("{") => self.parse_object(),
            other => Err(ExprError::new(
                format!("unexpected {}", describe(&other)),
                offset,
            )),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, ExprError> {
        let mut entries: Vec<(CompactString, Expr)> = Vec::new();
        if self.eat("}") {
            return Ok(Expr::Object(entries));
        }
        loop {
            let key = match self.advance() {
                TokenKind::Ident(name) | TokenKind::String(name) => name,
                other => {
                    return Err(ExprError::new(
                        format!("expected an object key, found {}", describe(&other)),
                        self.offset(),
                    ));
                }
            };
            self.expect(":")?;
            let value = self.parse_assignment()?;
            entries.push((key, value));
            if self.eat("}") {
                return Ok(Expr::Object(entries));
            }
            self.expect(",")?;
            if self.eat("}") {
                return Ok(Expr::Object(entries));
            }
        }
    }
}
