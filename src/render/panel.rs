//! Fixed-style inline panels shown in place of a component.

use super::Node;
use crate::core::SandboxError;

/// Panel for an error that ended a submission's pipeline.
pub fn error_panel(error: &SandboxError) -> Node {
    Node::element("div")
        .attr("class", "sandbox-error")
        .attr("role", "alert")
        .child(Node::element("strong").child(Node::text(error.summary())))
        .child(Node::element("pre").child(Node::text(error.detail())))
}

/// Fallback rendered by the error boundary.
pub fn boundary_fallback(message: &str) -> Node {
    Node::element("div")
        .attr("class", "sandbox-boundary")
        .attr("role", "alert")
        .child(Node::element("strong").child(Node::text("Something went wrong while rendering this component.")))
        .child(Node::element("pre").child(Node::text(message)))
}

/// Neutral placeholder shown while a subtree is suspended.
pub fn loading_placeholder() -> Node {
    Node::element("div")
        .attr("class", "sandbox-loading")
        .attr("aria-busy", "true")
        .child(Node::text("Loading…"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_panel_contains_raw_message() {
        let html = error_panel(&SandboxError::Compile("Unexpected token (1:24)".into())).to_html();
        assert!(html.starts_with("<div class=\"sandbox-error\" role=\"alert\">"));
        assert!(html.contains("The component failed to compile."));
        assert!(html.contains("<pre>Unexpected token (1:24)</pre>"));
    }

    #[test]
    fn test_boundary_fallback_escapes_message() {
        let html = boundary_fallback("Error: <boom>").to_html();
        assert!(html.contains("sandbox-boundary"));
        assert!(html.contains("Error: &lt;boom&gt;"));
    }
}
