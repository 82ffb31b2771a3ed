//! Configuration section definitions.
//!
//! | Section       | Purpose                                   |
//! |---------------|-------------------------------------------|
//! | `[context]`   | Rendering context timing and limits       |
//! | `[transform]` | Transformer worker compiler and cache     |
//! | `[runner]`    | Python runner process settings            |

mod context;
mod runner;
mod transform;

pub use context::ContextConfig;
pub use runner::RunnerConfig;
pub use transform::TransformConfig;
