//! Sap - The fine-grained reactive runtime for Sprout.
//!
//! Signals hold values, effects re-run when the signals they read change,
//! and computed cells are signals maintained by an internal effect.
//! Dependencies are tracked automatically: whatever an effect reads while
//! it runs becomes its subscription set for the next change.
//!
//! Everything hangs off an explicit [`Runtime`] handle. Effects and
//! computed cells return disposal handles, and a [`Scope`] groups all the
//! nodes created while it runs so a mounted component can be torn down at
//! once.
//!
//! # Example
//!
//! ```
//! use sprout_sap::Runtime;
//!
//! let runtime = Runtime::new();
//! let count = runtime.signal(1);
//! let c = count.clone();
//! let double = runtime.computed(move || c.get() * 2);
//!
//! count.set(21);
//! assert_eq!(double.get(), 42);
//! ```

mod computed;
mod effect;
mod error;
mod runtime;
mod scope;
mod signal;

pub use computed::Computed;
pub use effect::EffectHandle;
pub use error::{EffectError, ReactiveError};
pub use runtime::{EffectId, Runtime, ScopeId, SignalId, WeakRuntime, RUNAWAY_LIMIT};
pub use scope::Scope;
pub use signal::Signal;
