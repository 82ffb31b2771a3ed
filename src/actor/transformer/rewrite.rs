//! Textual rewrites applied to compiled module text.
//!
//! 1. `require("...")` calls become `void 0`. Calls spelled inside string
//!    or template literals are left alone; comments are not recognized.
//! 2. Top-level imports of the rendering library become `const` bindings
//!    from its global, so the module needs no resolver.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::TransformConfig;

/// Either a whole string literal (kept as is) or a `require` call.
static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<literal>"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\.)*`)|\brequire\(\s*(?:"[^"\n]*"|'[^'\n]*'|`[^`\n]*`)\s*\)"#,
    )
    .unwrap()
});

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(?:([^;'"]*?)\s+from\s+)?["'](react|react-dom|react-dom/client)["'][ \t]*;?"#,
    )
    .unwrap()
});

static NAMED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^}]*)\}").unwrap());

static NAMESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s*as\s+([\w$]+)").unwrap());

/// Globals the rendering library imports are bound to.
#[derive(Debug, Clone)]
pub struct Rewriter {
    react_global: String,
    dom_global: String,
}

impl Rewriter {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            react_global: config.react_global.clone(),
            dom_global: config.dom_global.clone(),
        }
    }

    pub fn apply(&self, code: &str) -> Result<String, String> {
        let code = REQUIRE_RE.replace_all(code, |caps: &Captures| match caps.name("literal") {
            Some(literal) => literal.as_str().to_owned(),
            None => "void 0".to_owned(),
        });

        let mut failure = None;
        let rewritten = IMPORT_RE.replace_all(&code, |caps: &Captures| {
            let global = match &caps[2] {
                "react" => &self.react_global,
                _ => &self.dom_global,
            };
            let clause = caps.get(1).map_or("", |m| m.as_str());
            match bindings(clause, global) {
                Ok(stmt) => stmt,
                Err(e) => {
                    failure.get_or_insert(e);
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(rewritten.into_owned()),
        }
    }
}

/// Turn an import clause into `const` declarations reading `global`.
fn bindings(clause: &str, global: &str) -> Result<String, String> {
    let source = format!("globalThis.{global}");
    let mut out = Vec::new();

    let mut rest = clause.to_owned();
    if let Some(named) = NAMED_RE.captures(clause) {
        let fields = named[1]
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|spec| {
                let spec = spec.strip_prefix("type ").unwrap_or(spec);
                match spec.split_once(" as ") {
                    Some((imported, local)) => format!("{}: {}", imported.trim(), local.trim()),
                    None => spec.to_owned(),
                }
            })
            .collect::<Vec<_>>();
        if !fields.is_empty() {
            out.push(format!("const {{ {} }} = {source};", fields.join(", ")));
        }
        rest = NAMED_RE.replace(&rest, "").into_owned();
    }
    if let Some(namespace) = NAMESPACE_RE.captures(&rest) {
        out.push(format!("const {} = {source};", &namespace[1]));
        rest = NAMESPACE_RE.replace(&rest, "").into_owned();
    }

    let default = rest.trim().trim_matches(',').trim();
    if !default.is_empty() {
        if !default.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return Err(format!("unsupported import clause `{}`", clause.trim()));
        }
        out.insert(0, format!("const {default} = {source};"));
    }

    Ok(out.join(" "))
}
