//! Host-side renderer for the isolated rendering context.
//!
//! # Module Structure
//!
//! - `node` - Rendered markup tree and HTML serialization
//! - `tree` - Walks the rendering library's element tree into `Node`s
//! - `boundary` - Error boundary (fault barrier)
//! - `suspense` - Deferred mount for subtrees waiting on async work
//! - `mount` - A loaded component under both wrappers
//! - `panel` - Inline error panel, boundary fallback, loading placeholder
//! - `document` - The context's document shell

mod boundary;
mod document;
mod mount;
mod node;
pub mod panel;
mod suspense;
mod tree;

pub use document::Document;
pub use mount::Mount;
pub use node::Node;
