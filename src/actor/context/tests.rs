use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use super::{ContextActor, ContextHandle};
use crate::actor::transformer::{Compile, CompilerLoader, oxc_loader};
use crate::config::{SandboxConfig, TransformConfig};
use crate::core::ContentHash;
use crate::protocol::{ContextMsg, Envelope, HostMsg, Origin, RenderOutcome, RenderResult};

const TIMEOUT: Duration = Duration::from_secs(20);

struct Harness {
    handle: ContextHandle,
    rx: mpsc::UnboundedReceiver<Envelope<ContextMsg>>,
    host: Origin,
    init_seen: usize,
}

fn test_config() -> SandboxConfig {
    let mut config = SandboxConfig::default();
    config.context.ready_delay_ms = 5;
    config
}

fn start_with(config: SandboxConfig, loader: CompilerLoader) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = ContextActor::spawn(Arc::new(config), loader, tx).unwrap();
    Harness {
        handle,
        rx,
        host: Origin::fresh(),
        init_seen: 0,
    }
}

impl Harness {
    async fn next(&mut self) -> Option<ContextMsg> {
        let envelope = tokio::time::timeout(TIMEOUT, self.rx.recv())
            .await
            .expect("context went silent")?;
        assert_eq!(envelope.origin, self.handle.origin);
        if envelope.message == ContextMsg::InitComplete {
            self.init_seen += 1;
        }
        Some(envelope.message)
    }

    async fn ready(&mut self) {
        assert_eq!(self.next().await, Some(ContextMsg::InitComplete));
    }

    fn submit(&self, code: &str) {
        self.handle
            .send(self.host, HostMsg::UpdateComponent { code: code.into() })
            .unwrap();
    }

    /// Wait for the result of `code`, skipping results of other submissions.
    async fn result_for(&mut self, code: &str) -> RenderResult {
        let hash = ContentHash::of(code);
        loop {
            match self.next().await {
                Some(ContextMsg::RenderResult(result)) if result.source_hash == hash => return result,
                Some(_) => {}
                None => panic!("context closed before rendering"),
            }
        }
    }

    async fn render(&mut self, code: &str) -> RenderResult {
        self.submit(code);
        self.result_for(code).await
    }

    async fn stop(mut self) {
        self.handle.send(self.host, HostMsg::Shutdown).unwrap();
        while self.next().await.is_some() {}
        self.handle.join();
    }
}

/// Markup inside `<div id="root">`, without the stylesheet.
fn root_of(document: &str) -> &str {
    let start = document.find("<div id=\"root\">").expect("no root element") + "<div id=\"root\">".len();
    let end = document.rfind("</div>").expect("root element not closed");
    &document[start..end]
}

async fn started() -> Harness {
    let mut harness = start_with(test_config(), oxc_loader());
    harness.ready().await;
    harness
}

#[tokio::test]
async fn test_null_component_renders_without_panel() {
    let mut ctx = started().await;
    let result = ctx.render("export default () => null;").await;
    assert_eq!(result.outcome, RenderOutcome::Success);
    assert_eq!(root_of(&result.document), "");
    ctx.stop().await;
}

#[tokio::test]
async fn test_jsx_component_renders() {
    let mut ctx = started().await;
    let code = r#"
        import React, { useState } from "react";
        interface Props { name?: string }
        export default function Greeting({ name = "world" }: Props) {
            const [count] = useState(2);
            return <section className="card"><h1>Hello {name}</h1><p>{count} items</p></section>;
        }
    "#;
    let result = ctx.render(code).await;
    assert_eq!(result.outcome, RenderOutcome::Success);
    assert!(result.document.contains(
        "<section class=\"card\"><h1>Hello world</h1><p>2 items</p></section>"
    ));
    ctx.stop().await;
}

#[tokio::test]
async fn test_identical_source_hits_cache_but_remounts() {
    let mut ctx = started().await;
    let code = "export default () => <b>same</b>;";

    let first = ctx.render(code).await;
    let second = ctx.render(code).await;
    assert_eq!(first.outcome, RenderOutcome::Success);
    assert_eq!(second.outcome, RenderOutcome::Success);
    assert_eq!(first.document, second.document);

    let stats = ctx.handle.stats().clone();
    let transform = stats.transform.snapshot();
    assert_eq!(transform.compilations, 1);
    assert_eq!(transform.hits, 1);
    // imported and mounted twice
    assert_eq!(stats.resources.created(), 2);
    assert_eq!(stats.resources.released(), 2);
    ctx.stop().await;
}

#[tokio::test]
async fn test_non_function_default_export_is_load_error() {
    let mut ctx = started().await;
    let result = ctx.render("export default 42;").await;
    assert_eq!(
        result.outcome,
        RenderOutcome::LoadError {
            message: "invalid default export: expected a component function, found number".into()
        }
    );
    assert!(root_of(&result.document).contains("sandbox-error"));

    let missing = ctx.render("export const Widget = () => null;").await;
    assert!(matches!(
        missing.outcome,
        RenderOutcome::LoadError { ref message } if message.ends_with("found undefined")
    ));
    ctx.stop().await;
}

#[tokio::test]
async fn test_malformed_source_is_compile_error_verbatim() {
    let source = "export default function( {";
    let expected = oxc_loader()(&TransformConfig::default())
        .unwrap_or_else(|e| panic!("{e}"))
        .compile(source)
        .unwrap_err();

    let mut ctx = started().await;
    let result = ctx.render(source).await;
    assert_eq!(result.outcome, RenderOutcome::CompileError { message: expected.clone() });
    assert!(result.document.contains("The component failed to compile."));
    ctx.stop().await;
}

#[tokio::test]
async fn test_throwing_component_shows_fallback() {
    let mut ctx = started().await;
    let result = ctx
        .render("export default function Broken() { throw new Error('render exploded'); }")
        .await;
    assert_eq!(
        result.outcome,
        RenderOutcome::RuntimeError {
            message: "Error: render exploded".into()
        }
    );
    // host shell intact, subtree replaced by the fallback
    assert!(result.document.starts_with("<!doctype html>"));
    assert!(result.document.contains("<div id=\"root\"><div class=\"sandbox-boundary\""));

    // the next submission gets a fresh boundary
    let next = ctx.render("export default () => <i>fine</i>;").await;
    assert_eq!(next.outcome, RenderOutcome::Success);
    ctx.stop().await;
}

#[tokio::test]
async fn test_later_submission_wins() {
    let mut ctx = started().await;
    let a = "export default () => <p>first</p>;";
    let b = "export default () => <p>second</p>;";
    ctx.submit(a);
    ctx.submit(b);

    let last = ctx.result_for(b).await;
    assert_eq!(last.outcome, RenderOutcome::Success);
    assert!(last.document.contains("<p>second</p>"));
    assert!(!last.document.contains("first"));

    let stats = ctx.handle.stats().clone();
    ctx.stop().await;
    assert_eq!(stats.resources.created(), stats.resources.released());
}

#[tokio::test]
async fn test_resources_released_on_every_path() {
    let mut ctx = started().await;
    ctx.render("export default () => null;").await;
    ctx.render("export default 'nope';").await;
    ctx.render("export default () => { throw 1; };").await;
    ctx.render("throw new Error('top level');").await;

    let stats = ctx.handle.stats().clone();
    assert_eq!(stats.resources.created(), 4);
    assert_eq!(stats.resources.released(), 4);
    assert_eq!(stats.resources.live(), 0);
    ctx.stop().await;
}

#[tokio::test]
async fn test_init_complete_once_even_if_compiler_fails() {
    let loader: CompilerLoader = Box::new(|_| Err("toolchain missing".into()));
    let mut ctx = start_with(test_config(), loader);
    ctx.ready().await;

    let result = ctx.render("export default () => null;").await;
    assert_eq!(
        result.outcome,
        RenderOutcome::CompileError {
            message: "compiler unavailable: toolchain missing".into()
        }
    );
    let again = ctx.render("export default () => 1;").await;
    assert!(matches!(again.outcome, RenderOutcome::CompileError { .. }));
    assert_eq!(ctx.init_seen, 1);
    ctx.stop().await;
}

#[tokio::test]
async fn test_binding_timeout_when_library_never_binds() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("partial-react.js");
    std::fs::write(&library, "globalThis.React = { createElement() { return null; } };").unwrap();

    let mut config = test_config();
    config.context.library = Some(library);
    config.context.binding_timeout_ms = 60;
    let mut ctx = start_with(config, oxc_loader());
    ctx.ready().await;

    let result = ctx.render("export default () => null;").await;
    assert_eq!(
        result.outcome,
        RenderOutcome::BindingTimeout {
            message: "rendering library was not bound within 60 ms".into()
        }
    );
    // the module resource is gone by the time the outcome is reported
    let resources = &ctx.handle.stats().resources;
    assert_eq!(resources.created(), 1);
    assert_eq!(resources.released(), 1);
    assert_eq!(resources.live(), 0);
    ctx.stop().await;
}

#[tokio::test]
async fn test_submission_superseded_while_waiting_for_bindings() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("unbound.js");
    std::fs::write(&library, "globalThis.loaded = true;").unwrap();

    let mut config = test_config();
    config.context.library = Some(library);
    config.context.binding_timeout_ms = 600;
    let mut ctx = start_with(config, oxc_loader());
    ctx.ready().await;

    let a = "export default () => <p>a</p>;";
    let b = "export default () => <p>b</p>;";
    ctx.submit(a);
    // a is compiled and polling by now
    tokio::time::sleep(Duration::from_millis(150)).await;
    ctx.submit(b);

    let reported = match ctx.next().await {
        Some(ContextMsg::RenderResult(result)) => result,
        other => panic!("expected a render result, got {other:?}"),
    };
    assert_eq!(reported.source_hash, ContentHash::of(b));
    assert!(matches!(reported.outcome, RenderOutcome::BindingTimeout { .. }));

    let stats = ctx.handle.stats().clone();
    ctx.stop().await;
    assert_eq!(stats.resources.created(), 2);
    assert_eq!(stats.resources.created(), stats.resources.released());
}

#[tokio::test]
async fn test_binding_poll_waits_for_async_library() {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("late-react.js");
    std::fs::write(
        &library,
        "Promise.resolve().then(() => {
            globalThis.React = { createElement: (type, props) => ({ $$typeof: 'sandbox.element', type, key: null, props: props || {} }) };
            globalThis.ReactDOM = {};
        });",
    )
    .unwrap();

    let mut config = test_config();
    config.context.library = Some(library);
    let mut ctx = start_with(config, oxc_loader());
    ctx.ready().await;

    let result = ctx.render("export default () => <hr />;").await;
    assert_eq!(result.outcome, RenderOutcome::Success);
    assert!(result.document.contains("<hr>"));
    ctx.stop().await;
}

#[tokio::test]
async fn test_messages_from_foreign_origin_ignored() {
    let mut ctx = started().await;
    let ours = "export default () => <u>ours</u>;";
    ctx.render(ours).await;

    ctx.handle
        .send(
            Origin::fresh(),
            HostMsg::UpdateComponent {
                code: "export default () => <u>intruder</u>;".into(),
            },
        )
        .unwrap();
    let follow_up = "export default () => <u>still ours</u>;";
    let result = ctx.render(follow_up).await;
    assert!(result.document.contains("still ours"));
    assert_eq!(ctx.handle.stats().transform.snapshot().misses, 2);
    ctx.stop().await;
}

#[tokio::test]
async fn test_message_before_ready_does_not_claim_peer() {
    let mut config = test_config();
    config.context.ready_delay_ms = 300;
    let mut ctx = start_with(config, oxc_loader());

    let intruder = Origin::fresh();
    ctx.handle
        .send(
            intruder,
            HostMsg::UpdateComponent {
                code: "export default () => <u>early</u>;".into(),
            },
        )
        .unwrap();
    ctx.ready().await;

    let result = ctx.render("export default () => <u>host</u>;").await;
    assert_eq!(result.outcome, RenderOutcome::Success);
    assert!(result.document.contains("<u>host</u>"));

    // the host is the peer now, the early sender stays locked out
    ctx.handle
        .send(
            intruder,
            HostMsg::UpdateComponent {
                code: "export default () => <u>late</u>;".into(),
            },
        )
        .unwrap();
    ctx.render("export default () => <u>host again</u>;").await;
    assert_eq!(ctx.handle.stats().transform.snapshot().misses, 2);
    ctx.stop().await;
}

#[tokio::test]
async fn test_shutdown_before_ready() {
    let mut config = test_config();
    config.context.ready_delay_ms = 5_000;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handle = ContextActor::spawn(Arc::new(config), oxc_loader(), tx).unwrap();

    handle.send(Origin::fresh(), HostMsg::Shutdown).unwrap();
    handle.join();
    assert!(rx.recv().await.is_none());
}
