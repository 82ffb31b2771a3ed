//! QuickJS runtime wrapper for the rendering context.
//!
//! | Module   | Purpose                                              |
//! |----------|------------------------------------------------------|
//! | `engine` | Runtime/context pair with limits and a deadline      |
//! | `error`  | Turning caught JavaScript values into messages       |

mod engine;
mod error;

pub use engine::Engine;
pub use error::{describe_caught, hooks, stringify};
