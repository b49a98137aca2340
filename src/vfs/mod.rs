//! Generator-backed virtual filesystem.
//!
//! Paths of a [`VirtualTree`] are produced on demand by registered generators
//! and fall through to a real filesystem when nothing is registered.
//!
//! # Generator kinds
//!
//! | Kind       | Matches        | Produces                                  |
//! |------------|----------------|-------------------------------------------|
//! | File       | exact path     | one file                                  |
//! | Dir        | path prefix    | child generators, resolved recursively    |
//! | Server     | path prefix    | any leaf below the prefix                 |
//!
//! Reads a generator makes through its [`Context`] are recorded in a
//! [`LinkGraph`], so [`VirtualTree::change`] can invalidate every output
//! derived from a changed input.

mod entry;
mod generator;
mod link;
mod radix;
mod serve;
mod tree;

pub use entry::Entry;
pub use generator::{
    skip, Dir, DirGenerator, FileGenerator, FileServer, GenFile, Generator, Skipped,
};
pub use link::LinkGraph;
pub use radix::RadixIndex;
pub use serve::{serve_transpiled, TranspileServer};
pub use tree::{Context, TreeBuilder, VirtualTree};
