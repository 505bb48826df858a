//! Mount errors.

use compact_str::CompactString;
use sprout_sap::EffectError;

use crate::eval::EvalError;

/// Failure while mounting a program or rebuilding part of it
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MountError {
    #[error("unknown component `{0}`")]
    UnknownComponent(CompactString),

    #[error("component `{0}` renders itself")]
    RecursiveComponent(CompactString),

    #[error("initializer of `${state}` failed: {error}")]
    State {
        state: CompactString,
        error: EvalError,
    },

    #[error("the reactive runtime was dropped")]
    RuntimeDropped,

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<MountError> for EffectError {
    fn from(error: MountError) -> Self {
        EffectError::new(error.to_string())
    }
}
