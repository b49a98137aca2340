//! Extension-to-extension transforms.
//!
//! Independent plugins each register a small step (`.md → .svelte`,
//! `.svelte → .jsx`) and the [`Transpiler`] chains them along the
//! minimum-hop route:
//!
//! ```text
//! transpile("intro.md", ".jsx")
//!
//!   .md ──loops──► .md ──edge──► .svelte ──loops──► .svelte ──edge──► .jsx ──loops──► .jsx
//!   hop 0                        hop 1                                 hop 2
//! ```
//!
//! Same-extension steps ("loops") run every time the chain visits their
//! extension, before the next hop.

mod error;
mod graph;
mod transpiler;

pub use error::TranspileError;
pub use graph::ExtensionGraph;
pub use transpiler::{File, TransformFn, Transpiler};
