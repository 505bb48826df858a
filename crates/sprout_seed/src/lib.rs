//! Seed - The component AST and shared building blocks for Sprout.
//!
//! Everything the other Sprout crates agree on lives here: the arena-allocated
//! component AST produced by the parser, the small expression language used
//! by state initializers, actions and bindings, compiler diagnostics, and the
//! hashing used to derive scope tags.
//!
//! # Example
//!
//! ```
//! use sprout_seed::expr::{parse_expression, Expr};
//!
//! let expr = parse_expression("$count + 1").unwrap();
//! let mut states = Vec::new();
//! expr.collect_states(&mut states);
//! assert_eq!(states, vec!["count"]);
//! ```

pub mod ast;
pub mod errors;
pub mod expr;
pub mod hash;

pub use ast::*;
pub use errors::{CompileError, ErrorCode};

// Re-export the allocator and string types the AST is built from
pub use bumpalo::collections::Vec as BumpVec;
pub use bumpalo::Bump;
pub use compact_str::CompactString;
