//! Compiler diagnostics.
//!
//! A compile unit fails as a whole on its first diagnostic. Every error
//! carries the 1-based line and column it was raised at.

use serde::{Deserialize, Serialize};

/// Diagnostic codes raised while parsing component source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    UnrecognizedPreambleLine = 0,
    InvalidStateName = 1,
    DuplicateState = 2,
    MissingInitializer = 3,
    InvalidEffect = 4,
    InvalidFetchPipeline = 5,
    InvalidAlias = 6,
    UnknownAlias = 7,
    InvalidElementHeader = 8,
    UnclosedContent = 9,
    UnexpectedContent = 10,
    UnterminatedString = 11,
    UnterminatedInterpolation = 12,
    InvalidInlineToken = 13,
    UnterminatedFence = 14,
    InvalidComponentName = 15,
    UnexpectedChildren = 16,
    DanglingElse = 17,
    ContentOutsideElement = 18,
    InvalidExpression = 19,
    UnknownState = 20,
    ItemOutsideLoop = 21,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnrecognizedPreambleLine => "Unrecognized line before the `---` separator.",
            Self::InvalidStateName => "Invalid state name.",
            Self::DuplicateState => "State is declared more than once.",
            Self::MissingInitializer => "State declaration is missing its initializer.",
            Self::InvalidEffect => "Invalid effect declaration.",
            Self::InvalidFetchPipeline => "Invalid fetch pipeline.",
            Self::InvalidAlias => "Invalid alias definition.",
            Self::UnknownAlias => "Use of an undefined alias.",
            Self::InvalidElementHeader => "Invalid element header.",
            Self::UnclosedContent => "Inline content is missing its closing `]`.",
            Self::UnexpectedContent => "Unexpected text on markup line.",
            Self::UnterminatedString => "Unterminated text literal.",
            Self::UnterminatedInterpolation => "Unterminated interpolation.",
            Self::InvalidInlineToken => "Unrecognized inline content.",
            Self::UnterminatedFence => "Fenced block is missing its closing fence.",
            Self::InvalidComponentName => "Component references must be capitalized identifiers.",
            Self::UnexpectedChildren => "This line cannot have nested children.",
            Self::DanglingElse => "`? else` must directly follow a conditional block.",
            Self::ContentOutsideElement => "Attributes and events must belong to an element.",
            Self::InvalidExpression => "Invalid expression.",
            Self::UnknownState => "Reference to an undeclared state.",
            Self::ItemOutsideLoop => "Item fields can only be read inside a loop.",
        }
    }
}

/// A positional compile diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("line {line}, column {column}: {detail}")]
pub struct CompileError {
    pub code: ErrorCode,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number
    pub column: u32,
    /// Human readable cause
    pub detail: String,
}

impl CompileError {
    pub fn new(code: ErrorCode, line: u32, column: u32) -> Self {
        Self {
            code,
            line,
            column,
            detail: code.message().to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}
