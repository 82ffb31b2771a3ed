//! Walks the element tree produced by the rendering library.
//!
//! Elements are read through the `__sandbox` host hooks, so both the
//! embedded library and a real React build (symbol-tagged elements) can be
//! rendered.

use rquickjs::convert::Coerced;
use rquickjs::function::IntoArgs;
use rquickjs::{CatchResultExt, CaughtError, Ctx, FromJs, Function, Object, Value};

use super::Node;
use super::node::{attribute_name, style_declaration};
use crate::runtime::{describe_caught, hooks};

/// Nesting limit for elements and components.
const MAX_DEPTH: usize = 256;

/// Why a subtree could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFault {
    /// Something threw (or the tree is malformed).
    Thrown(String),
    /// A thenable was thrown: the subtree is waiting on async work.
    Suspended,
}

pub struct TreeRenderer<'js> {
    ctx: Ctx<'js>,
    classify: Function<'js>,
    to_array: Function<'js>,
    render_component: Function<'js>,
    render_wrapped: Function<'js>,
    is_thenable: Function<'js>,
}

impl<'js> TreeRenderer<'js> {
    pub fn new(ctx: Ctx<'js>) -> Result<Self, RenderFault> {
        let lookup = |hooks: &Object<'js>, name: &str| hooks.get::<_, Function<'js>>(name);
        let build = || -> rquickjs::Result<_> {
            let hooks = hooks(&ctx)?;
            Ok((
                lookup(&hooks, "classify")?,
                lookup(&hooks, "toArray")?,
                lookup(&hooks, "renderComponent")?,
                lookup(&hooks, "renderWrapped")?,
                lookup(&hooks, "isThenable")?,
            ))
        };
        let (classify, to_array, render_component, render_wrapped, is_thenable) = build()
            .map_err(|e| RenderFault::Thrown(format!("host hooks unavailable: {e}")))?;
        Ok(Self {
            ctx,
            classify,
            to_array,
            render_component,
            render_wrapped,
            is_thenable,
        })
    }

    /// Render a component with empty props.
    pub fn render_root(&self, component: Function<'js>) -> Result<Node, RenderFault> {
        let props = self.guard(Object::new(self.ctx.clone()))?;
        let rendered: Value<'js> = self.call(&self.render_component, (component, props))?;
        self.render_value(rendered, 1)
    }

    fn render_value(&self, value: Value<'js>, depth: usize) -> Result<Node, RenderFault> {
        if depth > MAX_DEPTH {
            return Err(RenderFault::Thrown(format!(
                "maximum render depth of {MAX_DEPTH} exceeded"
            )));
        }

        let kind: String = self.call(&self.classify, (value.clone(),))?;
        match kind.as_str() {
            "empty" => Ok(Node::empty()),
            "text" => Ok(Node::Text(self.coerce(&value)?)),
            "list" => {
                let items: Vec<Value<'js>> = self.call(&self.to_array, (value,))?;
                items
                    .into_iter()
                    .map(|item| self.render_value(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Node::Fragment)
            }
            "host" | "fragment" | "component" | "forwardRef" | "memo" => {
                let element = self.object(value)?;
                let ty: Value<'js> = self.guard(element.get("type"))?;
                let props: Object<'js> = self.guard(element.get::<_, Option<Object<'js>>>("props"))?
                    .map_or_else(|| self.guard(Object::new(self.ctx.clone())), Ok)?;
                match kind.as_str() {
                    "host" => self.render_host(self.coerce(&ty)?, &props, depth),
                    "fragment" => {
                        let children: Value<'js> = self.guard(props.get("children"))?;
                        self.render_value(children, depth + 1)
                    }
                    "component" => {
                        let rendered: Value<'js> = self.call(&self.render_component, (ty, props))?;
                        self.render_value(rendered, depth + 1)
                    }
                    _ => {
                        let rendered: Value<'js> = self.call(&self.render_wrapped, (ty, props))?;
                        self.render_value(rendered, depth + 1)
                    }
                }
            }
            _ => Err(RenderFault::Thrown(format!(
                "Objects are not valid as a React child (found: {})",
                crate::runtime::stringify(&self.ctx, &value)
            ))),
        }
    }

    fn render_host(&self, tag: String, props: &Object<'js>, depth: usize) -> Result<Node, RenderFault> {
        let mut attrs = Vec::new();
        let mut children = Vec::new();

        for key in props.keys::<String>() {
            let key = self.guard(key)?;
            let value: Value<'js> = self.guard(props.get(key.as_str()))?;
            match key.as_str() {
                "children" => children.push(self.render_value(value, depth + 1)?),
                "key" | "ref" | "suppressHydrationWarning" | "suppressContentEditableWarning" => {}
                "dangerouslySetInnerHTML" => {
                    if let Some(inner) = value.as_object() {
                        let html: Option<Coerced<String>> = self.guard(inner.get("__html"))?;
                        if let Some(Coerced(html)) = html {
                            children.push(Node::Raw(html));
                        }
                    }
                }
                "style" => {
                    if let Some(style) = self.style(&value)? {
                        attrs.push(("style".to_owned(), style));
                    }
                }
                name if name.starts_with("on") && value.is_function() => {}
                name => {
                    if let Some(text) = self.attribute_value(name, &value)? {
                        attrs.push((attribute_name(name).to_owned(), text));
                    }
                }
            }
        }

        Ok(Node::Element {
            tag,
            attrs,
            children,
        })
    }

    fn attribute_value(&self, name: &str, value: &Value<'js>) -> Result<Option<String>, RenderFault> {
        if value.is_undefined() || value.is_null() || value.is_function() || value.is_symbol() {
            return Ok(None);
        }
        if let Some(flag) = value.as_bool() {
            let enumerated = name.starts_with("aria-") || name.starts_with("data-");
            return Ok(match (flag, enumerated) {
                (true, true) => Some("true".to_owned()),
                (false, true) => Some("false".to_owned()),
                (true, false) => Some(String::new()),
                (false, false) => None,
            });
        }
        self.coerce(value).map(Some)
    }

    fn style(&self, value: &Value<'js>) -> Result<Option<String>, RenderFault> {
        if let Some(text) = value.as_string() {
            return self.guard(text.to_string()).map(Some);
        }
        let Some(style) = value.as_object() else {
            return Ok(None);
        };

        let mut declarations = Vec::new();
        for key in style.keys::<String>() {
            let key = self.guard(key)?;
            let entry: Value<'js> = self.guard(style.get(key.as_str()))?;
            if entry.is_undefined() || entry.is_null() || entry.as_bool().is_some() {
                continue;
            }
            let numeric = entry.is_number();
            declarations.push(style_declaration(&key, &self.coerce(&entry)?, numeric));
        }
        Ok((!declarations.is_empty()).then(|| declarations.join(";")))
    }

    fn object(&self, value: Value<'js>) -> Result<Object<'js>, RenderFault> {
        value
            .into_object()
            .ok_or_else(|| RenderFault::Thrown("element is not an object".to_owned()))
    }

    fn coerce(&self, value: &Value<'js>) -> Result<String, RenderFault> {
        self.guard(value.get::<Coerced<String>>()).map(|Coerced(text)| text)
    }

    fn call<A, R>(&self, function: &Function<'js>, args: A) -> Result<R, RenderFault>
    where
        A: IntoArgs<'js>,
        R: FromJs<'js>,
    {
        self.guard(function.call(args))
    }

    fn guard<T>(&self, result: rquickjs::Result<T>) -> Result<T, RenderFault> {
        result.catch(&self.ctx).map_err(|err| self.fault(err))
    }

    fn fault(&self, err: CaughtError<'js>) -> RenderFault {
        if let CaughtError::Value(value) = &err
            && self
                .is_thenable
                .call::<_, bool>((value.clone(),))
                .unwrap_or(false)
        {
            return RenderFault::Suspended;
        }
        RenderFault::Thrown(describe_caught(&self.ctx, &err))
    }
}
