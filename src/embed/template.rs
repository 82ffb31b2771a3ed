//! Named placeholder substitution for embedded shells.
//!
//! A placeholder is written `__SANDBOX_<NAME>__`. Each template is tied to
//! one [`TemplateVars`] type, so a shell can only be filled with the
//! variables it was written for.

use std::marker::PhantomData;

/// Values for one template, as `(NAME, value)` pairs.
pub trait TemplateVars {
    fn pairs(&self) -> Vec<(&'static str, &str)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    /// Fill every placeholder named by `vars`. Values are inserted as-is.
    pub fn render(&self, vars: &V) -> String {
        vars.pairs()
            .into_iter()
            .fold(self.content.to_owned(), |out, (name, value)| {
                out.replace(&placeholder(name), value)
            })
    }
}

fn placeholder(name: &str) -> String {
    format!("__SANDBOX_{name}__")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting<'a>(&'a str);

    impl TemplateVars for Greeting<'_> {
        fn pairs(&self) -> Vec<(&'static str, &str)> {
            vec![("NAME", self.0)]
        }
    }

    #[test]
    fn test_fills_repeated_placeholders() {
        let template: Template<Greeting> = Template::new("hi __SANDBOX_NAME__, bye __SANDBOX_NAME__");
        assert_eq!(template.render(&Greeting("ada")), "hi ada, bye ada");
    }

    #[test]
    fn test_unknown_placeholders_left_alone() {
        let template: Template<Greeting> = Template::new("__SANDBOX_OTHER__");
        assert_eq!(template.render(&Greeting("ada")), "__SANDBOX_OTHER__");
    }
}
