//! Dynamic import of a compiled module and default-export check.

use std::time::Duration;

use rquickjs::{CatchResultExt, Function, Module, Persistent, Value};

use super::resource::ObjectUrl;
use crate::core::SandboxError;
use crate::runtime::{Engine, describe_caught, hooks};

/// Import `resource` as an ES module and return its default export.
pub fn import(
    engine: &Engine,
    resource: &ObjectUrl,
    timeout: Duration,
) -> Result<Persistent<Function<'static>>, SandboxError> {
    let deadline = engine.arm_deadline(timeout);

    engine.with(|ctx| {
        let load_error = |err| SandboxError::Load(deadline.explain(describe_caught(&ctx, &err)));

        let declared = Module::declare(ctx.clone(), resource.url(), resource.source())
            .catch(&ctx)
            .map_err(load_error)?;
        let (module, evaluation) = declared.eval().catch(&ctx).map_err(load_error)?;
        evaluation.finish::<Value>().catch(&ctx).map_err(load_error)?;

        let export: Value = module.get("default").catch(&ctx).map_err(load_error)?;
        match export.as_function() {
            Some(component) => Ok(Persistent::save(&ctx, component.clone())),
            None => {
                let found = hooks(&ctx)
                    .and_then(|hooks| hooks.get::<_, Function>("describe"))
                    .and_then(|describe| describe.call::<_, String>((export.clone(),)))
                    .unwrap_or_else(|_| "unknown".to_owned());
                Err(SandboxError::Load(format!(
                    "invalid default export: expected a component function, found {found}"
                )))
            }
        }
    })
}
