//! Errors surfaced through the runtime's error channel.

use crate::runtime::EffectId;

/// Failure raised by an effect body or an asynchronous continuation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EffectError {
    message: String,
}

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for EffectError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for EffectError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Everything the error channel can receive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactiveError {
    #[error("effect {effect} failed: {error}")]
    Effect { effect: EffectId, error: EffectError },

    #[error("effect {effect} retriggered itself more than {limit} times")]
    Runaway { effect: EffectId, limit: usize },

    #[error("async task failed: {0}")]
    Async(EffectError),

    #[error("computed value failed: {0}")]
    Computed(EffectError),

    #[error("`{event}` handler failed: {error}")]
    Handler { event: String, error: EffectError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ReactiveError::Async(EffectError::new("HTTP 500"));
        insta::assert_snapshot!(err.to_string(), @"async task failed: HTTP 500");
    }

    #[test]
    fn test_conversions() {
        let err: EffectError = "boom".into();
        assert_eq!(err.message(), "boom");
        let err: EffectError = String::from("bang").into();
        assert_eq!(err.to_string(), "bang");
    }
}
