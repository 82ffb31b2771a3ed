use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Compile, CompilerLoader, TransformerActor, TransformerHandle, oxc_loader};
use crate::config::TransformConfig;
use crate::core::{SeqCursor, SubmissionSeq};
use crate::protocol::{Envelope, Origin, WorkerRequest, WorkerResponse};

const TIMEOUT: Duration = Duration::from_secs(10);

fn request(handle: &TransformerHandle, code: &str, seq: SubmissionSeq) -> WorkerResponse {
    handle
        .tx
        .send(Envelope::new(
            handle.origin,
            WorkerRequest::TransformCode {
                code: code.into(),
                seq,
            },
        ))
        .unwrap();
    let envelope = handle.rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(envelope.origin, handle.worker_origin);
    envelope.message
}

fn failing_loader(loads: Arc<AtomicUsize>) -> CompilerLoader {
    Box::new(move |_| {
        loads.fetch_add(1, Ordering::SeqCst);
        Err("wasm blob missing".into())
    })
}

#[test]
fn test_transform_success_and_cache_hit() {
    let handle = TransformerActor::spawn(TransformConfig::default(), oxc_loader(), Arc::default()).unwrap();
    let mut seqs = SeqCursor::new();
    let code = "import React from 'react';\nexport default () => <p>hi</p>;";

    let sent = seqs.advance();
    let first = request(&handle, code, sent);
    let WorkerResponse::TransformSuccess { transformed_code, seq } = first else {
        panic!("expected success, got {first:?}");
    };
    assert_eq!(seq, sent);
    assert!(transformed_code.contains("const React = globalThis.React;"));
    assert!(transformed_code.contains("React.createElement"));

    let second = request(&handle, code, seqs.advance());
    assert!(matches!(
        &second,
        WorkerResponse::TransformSuccess { transformed_code: again, .. } if *again == transformed_code
    ));

    let stats = handle.stats.snapshot();
    assert_eq!(stats.compilations, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
    handle.shutdown();
}

#[test]
fn test_compile_error_keeps_worker_usable() {
    let handle = TransformerActor::spawn(TransformConfig::default(), oxc_loader(), Arc::default()).unwrap();
    let mut seqs = SeqCursor::new();

    let bad = seqs.advance();
    match request(&handle, "export default function( {", bad) {
        WorkerResponse::TransformError { error, seq } => {
            assert_eq!(seq, bad);
            assert!(!error.is_empty());
        }
        other => panic!("expected error, got {other:?}"),
    }

    let good = request(&handle, "export default () => null;", seqs.advance());
    assert!(matches!(good, WorkerResponse::TransformSuccess { .. }));
    assert_eq!(handle.stats.snapshot().failures, 1);
    handle.shutdown();
}

#[test]
fn test_compiler_load_failure_is_permanent() {
    let loads = Arc::new(AtomicUsize::new(0));
    let handle =
        TransformerActor::spawn(TransformConfig::default(), failing_loader(Arc::clone(&loads)), Arc::default())
            .unwrap();
    let mut seqs = SeqCursor::new();

    for _ in 0..3 {
        match request(&handle, "export default () => null;", seqs.advance()) {
            WorkerResponse::TransformError { error, .. } => {
                assert_eq!(error, "compiler unavailable: wasm blob missing");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    handle.shutdown();
}

struct Exploding;

impl Compile for Exploding {
    fn compile(&self, _: &str) -> Result<String, String> {
        panic!("index out of bounds")
    }
}

#[test]
fn test_compiler_panic_becomes_error() {
    let loader: CompilerLoader = Box::new(|_| Ok(Box::new(Exploding) as Box<dyn Compile>));
    let handle = TransformerActor::spawn(TransformConfig::default(), loader, Arc::default()).unwrap();

    match request(&handle, "x", SeqCursor::new().advance()) {
        WorkerResponse::TransformError { error, .. } => {
            assert_eq!(error, "compiler panicked: index out of bounds");
        }
        other => panic!("expected error, got {other:?}"),
    }
    // still answering
    let again = request(&handle, "y", SeqCursor::new().advance());
    assert!(matches!(again, WorkerResponse::TransformError { .. }));
    handle.shutdown();
}

#[test]
fn test_foreign_origin_rejected() {
    let handle = TransformerActor::spawn(TransformConfig::default(), oxc_loader(), Arc::default()).unwrap();
    let seq = SeqCursor::new().advance();

    // First contact fixes the peer origin.
    let response = request(&handle, "export default () => null;", seq);
    assert!(matches!(response, WorkerResponse::TransformSuccess { .. }));

    handle
        .tx
        .send(Envelope::new(
            Origin::fresh(),
            WorkerRequest::TransformCode {
                code: "export default 1;".into(),
                seq,
            },
        ))
        .unwrap();
    assert!(handle.rx.recv_timeout(Duration::from_millis(200)).is_err());
    handle.shutdown();
}
