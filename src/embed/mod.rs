//! Embedded static resources for the sandbox.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `runtime` - Scripts installed into every rendering context and the
//!   document shell the context renders into
//!
//! Scripts are minified by `build.rs` and included from `OUT_DIR`.

mod template;

pub use template::{Template, TemplateVars};

pub mod runtime {
    use super::{Template, TemplateVars};

    /// Host hooks (`globalThis.__sandbox`) used by the renderer.
    pub const HOST_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/host.min.js"));

    /// Default rendering library (`globalThis.React`, `globalThis.ReactDOM`).
    pub const REACT_SHIM_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/react-shim.min.js"));

    /// Variables for document.html. Both are already-escaped HTML.
    pub struct DocumentVars {
        pub title: String,
        pub body: String,
    }

    impl TemplateVars for DocumentVars {
        fn pairs(&self) -> Vec<(&'static str, &str)> {
            vec![("TITLE", self.title.as_str()), ("BODY", self.body.as_str())]
        }
    }

    /// Document shell owned by a rendering context.
    pub const DOCUMENT_HTML: Template<DocumentVars> =
        Template::new(include_str!("runtime/document.html"));
}
