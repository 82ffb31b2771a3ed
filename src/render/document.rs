//! The document owned by a rendering context.

use super::Node;
use crate::embed::runtime::{DOCUMENT_HTML, DocumentVars};

/// Document shell plus the current content of its root container.
#[derive(Debug, Clone)]
pub struct Document {
    title: String,
    body: Node,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Node::empty(),
        }
    }

    /// Replace the root container's content wholesale.
    pub fn set_body(&mut self, body: Node) {
        self.body = body;
    }

    pub fn to_html(&self) -> String {
        DOCUMENT_HTML.render(&DocumentVars {
            title: Node::text(self.title.as_str()).to_html(),
            body: self.body.to_html(),
        })
    }
}
