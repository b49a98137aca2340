//! # genfs
//!
//! Incremental build core for code generators.
//!
//! - **Transform graph**: chain per-extension transformers
//!   (`.md → .svelte → .js`) through shortest-path composition.
//! - **Virtual tree**: files produced on demand by registered generators,
//!   falling through to a real directory, with dependency-driven
//!   invalidation.
//! - **Sync**: diff a (virtual) source tree against disk and write only what
//!   changed.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use genfs::prelude::*;
//!
//! let mut transpiler = Transpiler::new();
//! transpiler
//!     .add(".svelte", ".js", |file| {
//!         file.data = format!("export default `{}`", file.text()?).into_bytes();
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let transpiler = Arc::new(transpiler);
//!
//! let src = MemFs::new();
//! src.insert("view/index.svelte", "<h1>hi</h1>");
//! let tree = VirtualTree::new(src);
//!
//! // Any leaf below the prefix, converted on request
//! tree.register("bud/view", serve_transpiled(transpiler.clone(), "view"));
//! assert_eq!(
//!     tree.read_file("bud/view/index.js").unwrap(),
//!     b"export default `<h1>hi</h1>`"
//! );
//!
//! // A listed file, synced to disk
//! tree.generate_file("bud/entry.js", move |ctx, file| {
//!     let code = ctx.read("view/index.svelte")?;
//!     file.data = transpiler.transpile("view/index.svelte", ".js", code)?;
//!     Ok(())
//! });
//!
//! let out = MemFs::new();
//! let report = Syncer::new(&tree, "bud", &out, "bud").sync().unwrap();
//! assert_eq!(report.created, 1);
//! assert!(out.exists("bud/entry.js"));
//! ```
//!
//! ## Modules
//!
//! - [`transform`]: extension graph and [`Transpiler`](transform::Transpiler)
//! - [`vfs`]: [`VirtualTree`](vfs::VirtualTree) and generator kinds
//! - [`sync`]: [`Syncer`](sync::Syncer) and stamp strategies
//! - [`fs`]: the `ReadFs`/`WriteFs` seam with disk and in-memory trees
//! - [`path`]: tree path helpers
//! - [`config`]: process-wide defaults

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod fs;
pub mod path;
pub mod prelude;
pub mod sync;
pub mod transform;
pub mod vfs;

/// Boxed error returned by generator and transform callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub use fs::FsError;
pub use sync::SyncError;
pub use transform::TranspileError;
