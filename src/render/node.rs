//! Rendered markup tree and its HTML serialization.

use std::fmt::Write;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the rendered document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text(String),
    /// Trusted markup (`dangerouslySetInnerHTML`), emitted as is.
    Raw(String),
    Fragment(Vec<Node>),
}

impl Node {
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub const fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    /// Builder: add an attribute (no-op on non-elements).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.push((name.into(), value.into()));
        }
        self
    }

    /// Builder: append a child (no-op on text and raw nodes).
    pub fn child(mut self, node: Node) -> Self {
        match &mut self {
            Self::Element { children, .. } | Self::Fragment(children) => children.push(node),
            Self::Text(_) | Self::Raw(_) => {}
        }
        self
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) => escape_into(out, text, false),
            Self::Raw(html) => out.push_str(html),
            Self::Fragment(children) => children.iter().for_each(|c| c.write_html(out)),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attrs {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"");
                        escape_into(out, value, true);
                        out.push('"');
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                children.iter().for_each(|c| c.write_html(out));
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Map a JSX prop name to its HTML attribute name.
pub fn attribute_name(prop: &str) -> &str {
    match prop {
        "className" => "class",
        "htmlFor" => "for",
        "tabIndex" => "tabindex",
        "readOnly" => "readonly",
        "autoFocus" => "autofocus",
        "defaultValue" => "value",
        "defaultChecked" => "checked",
        other => other,
    }
}

/// CSS properties that take unitless numbers.
const UNITLESS: &[&str] = &[
    "flex", "flexGrow", "flexShrink", "fontWeight", "lineHeight", "opacity", "order", "zIndex",
    "zoom",
];

/// Serialize one `style` entry: camelCase name to kebab-case, numbers get `px`.
pub fn style_declaration(name: &str, value: &str, numeric: bool) -> String {
    let mut property = String::with_capacity(name.len() + 4);
    if name.starts_with("--") {
        property.push_str(name);
    } else {
        for ch in name.chars() {
            if ch.is_ascii_uppercase() {
                property.push('-');
                property.push(ch.to_ascii_lowercase());
            } else {
                property.push(ch);
            }
        }
    }
    let unit = numeric && value != "0" && !UNITLESS.contains(&name) && !name.starts_with("--");
    format!("{property}:{value}{}", if unit { "px" } else { "" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_serialization() {
        let node = Node::element("div")
            .attr("class", "card")
            .child(Node::text("a < b & \"c\""))
            .child(Node::element("br"))
            .child(Node::element("input").attr("disabled", ""));
        assert_eq!(
            node.to_html(),
            "<div class=\"card\">a &lt; b &amp; \"c\"<br><input disabled></div>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let node = Node::element("a").attr("title", "say \"hi\" <now>");
        assert_eq!(node.to_html(), "<a title=\"say &quot;hi&quot; &lt;now&gt;\"></a>");
    }

    #[test]
    fn test_fragment_and_raw() {
        let node = Node::Fragment(vec![Node::Raw("<b>x</b>".into()), Node::text("y")]);
        assert_eq!(node.to_html(), "<b>x</b>y");
        assert_eq!(Node::empty().to_html(), "");
    }

    #[test]
    fn test_style_declaration() {
        assert_eq!(style_declaration("marginTop", "4", true), "margin-top:4px");
        assert_eq!(style_declaration("opacity", "0.5", true), "opacity:0.5");
        assert_eq!(style_declaration("color", "red", false), "color:red");
        assert_eq!(style_declaration("--gap", "2", true), "--gap:2");
    }

    #[test]
    fn test_attribute_name() {
        assert_eq!(attribute_name("className"), "class");
        assert_eq!(attribute_name("id"), "id");
    }
}
