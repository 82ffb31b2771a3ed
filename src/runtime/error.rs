//! Messages for values thrown by sandboxed code.

use rquickjs::{CaughtError, Ctx, Function, Object, Value};

/// The frozen `globalThis.__sandbox` hook object.
pub fn hooks<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    ctx.globals().get("__sandbox")
}

/// Render a caught JavaScript error as `Name: message`.
pub fn describe_caught<'js>(ctx: &Ctx<'js>, err: &CaughtError<'js>) -> String {
    match err {
        CaughtError::Exception(exception) => {
            let message = exception.message().unwrap_or_default();
            let name = exception
                .as_object()
                .get::<_, Option<String>>("name")
                .ok()
                .flatten()
                .unwrap_or_else(|| "Error".to_owned());
            if message.is_empty() {
                name
            } else {
                format!("{name}: {message}")
            }
        }
        CaughtError::Value(value) => stringify(ctx, value),
        CaughtError::Error(error) => error.to_string(),
    }
}

/// Best-effort string form of an arbitrary thrown value.
pub fn stringify<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    hooks(ctx)
        .and_then(|hooks| hooks.get::<_, Function>("stringify"))
        .and_then(|stringify| stringify.call::<_, String>((value.clone(),)))
        .unwrap_or_else(|_| format!("uncaught {}", value.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::runtime::Engine;
    use rquickjs::CatchResultExt;

    fn caught(source: &str) -> String {
        let engine = Engine::new(&ContextConfig::default()).unwrap();
        engine.with(|ctx| {
            let err = ctx.eval::<(), _>(source).catch(&ctx).unwrap_err();
            describe_caught(&ctx, &err)
        })
    }

    #[test]
    fn test_describe_error_object() {
        assert_eq!(caught("throw new RangeError('too far')"), "RangeError: too far");
    }

    #[test]
    fn test_describe_thrown_value() {
        assert_eq!(caught("throw 'plain string'"), "plain string");
        assert_eq!(caught("throw { code: 7 }"), "{\"code\":7}");
    }
}
