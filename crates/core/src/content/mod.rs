// crates/core/src/content/mod.rs
//! Page content resolution.
//!
//! The worker resolves every selected `(space, page)` pair to its title and
//! text through a [`ContentResolver`] before assembling the prompt.

pub mod docmost;
pub mod resolver;

pub use docmost::DocmostFetcher;
pub use resolver::{ContentResolver, PageContent};
