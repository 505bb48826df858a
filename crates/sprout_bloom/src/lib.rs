//! Bloom - The rendering primitives for Sprout.
//!
//! The Rust side of the rendering primitive library that generated modules
//! import. A [`Host`] abstracts the node tree, [`Document`] is an in-memory
//! host that serializes to HTML, and [`Renderer`] mounts a lowered
//! [`RenderProgram`](sprout_graft::RenderProgram) against any host by
//! driving the `sprout_sap` runtime the same way the emitted JavaScript does.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use sprout_bloom::{Document, Host, Renderer};
//!
//! let bump = sprout_seed::Bump::new();
//! let component = sprout_trellis::parse(&bump, "$n:1\n---\np[$n]")?;
//! let (program, _) = sprout_graft::lower(&component, "Counter");
//!
//! let doc = Rc::new(Document::new());
//! let renderer = Renderer::new(sprout_sap::Runtime::new(), doc.clone());
//! let mounted = renderer.mount(&program, doc.root())?;
//! assert_eq!(doc.to_html(doc.root()), "<p>1</p>");
//! mounted.set_state("n", 2.into())?;
//! assert_eq!(doc.to_html(doc.root()), "<p>2</p>");
//! ```

pub mod document;
mod error;
pub mod eval;
pub mod fetch;
pub mod host;
pub mod list;
mod render;
pub mod value;

pub use document::Document;
pub use error::MountError;
pub use eval::{Env, EvalError, StateCell, States};
pub use fetch::{
    apply_stages, DeferredFetcher, FetchError, FetchResponse, FetchResult, Fetcher, Respond,
    StaticFetcher,
};
pub use host::{Event, Host, Listener, NodeId};
pub use list::{render_list, ListSource};
pub use render::{Mounted, Renderer};
