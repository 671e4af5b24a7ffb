#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use tokio::sync::oneshot;
use tonic::{Code, Status};

use tenantmux_gateway::context::CallMeta;
use tenantmux_gateway::interceptor::ERROR_CODE_KEY;
use tenantmux_gateway::rpc::proto::HelloReply;

use common::{chain, request_as};

const METHOD: &str = "/helloworld.Greeter/SayHello";

fn echo(name: &str) -> Result<HelloReply, Status> {
    Ok(HelloReply { message: format!("Hello {name}"), ..Default::default() })
}

fn explode() -> Result<HelloReply, Status> {
    panic!("handler exploded")
}

#[tokio::test]
async fn admitted_calls_are_counted_and_released() {
    let c = chain(&["tenant-a"]);

    let mut tasks = Vec::new();
    for i in 0..50 {
        let c = c.clone();
        tasks.push(tokio::spawn(async move {
            c.unary(CallMeta::new(METHOD, None), request_as(Some("tenant-a"), "n"), |_ctx, req| async move {
                tokio::time::sleep(Duration::from_millis(i % 5)).await;
                echo(&req.name)
            })
            .await
        }));
    }
    for t in tasks {
        let resp = t.await.unwrap().unwrap();
        assert_eq!(resp.get_ref().message, "Hello n");
    }

    assert_eq!(c.metrics().request_count("tenant-a"), 50);
    assert_eq!(c.metrics().open_connections("tenant-a"), 0);
}

#[tokio::test]
async fn gauge_is_held_while_handler_runs() {
    let c = chain(&["tenant-a"]);
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let call = {
        let c = c.clone();
        tokio::spawn(async move {
            c.unary(CallMeta::new(METHOD, None), request_as(Some("tenant-a"), "n"), |_ctx, req| async move {
                let _ = started_tx.send(());
                let _ = release_rx.await;
                echo(&req.name)
            })
            .await
        })
    };

    started_rx.await.unwrap();
    assert_eq!(c.metrics().open_connections("tenant-a"), 1);
    assert_eq!(c.metrics().request_count("tenant-a"), 1);

    release_tx.send(()).unwrap();
    call.await.unwrap().unwrap();
    assert_eq!(c.metrics().open_connections("tenant-a"), 0);
}

#[tokio::test]
async fn denied_tenant_is_rejected_without_counting() {
    let c = chain(&["tenant-a"]);
    let err = c
        .unary(CallMeta::new(METHOD, None), request_as(Some("tenant-b"), "n"), |_ctx, req| async move {
            echo(&req.name)
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Wrong Tenant-Id for instance");
    assert_eq!(err.metadata().get(ERROR_CODE_KEY).unwrap(), "TENANT_DENIED");
    assert_eq!(c.metrics().request_count("tenant-b"), 0);
    assert_eq!(c.metrics().open_connections("tenant-b"), 0);
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let c = chain(&["tenant-a"]);
    let err = c
        .unary(CallMeta::new(METHOD, None), request_as(None, "n"), |_ctx, req| async move {
            echo(&req.name)
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Missing X-Tenant-Id header");
    assert_eq!(err.metadata().get(ERROR_CODE_KEY).unwrap(), "MISSING_TENANT_HEADER");
}

#[tokio::test]
async fn handler_error_passes_through() {
    let c = chain(&["tenant-a"]);
    let err = c
        .unary(CallMeta::new(METHOD, None), request_as(Some("tenant-a"), "n"), |_ctx, _req| async move {
            Err::<HelloReply, _>(Status::not_found("nobody home"))
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::NotFound);
    assert_eq!(c.metrics().request_count("tenant-a"), 1);
    assert_eq!(c.metrics().open_connections("tenant-a"), 0);
}

#[tokio::test]
async fn handler_panic_becomes_internal_and_releases_gauge() {
    let c = chain(&["tenant-a"]);
    let err = c
        .unary(CallMeta::new(METHOD, None), request_as(Some("tenant-a"), "n"), |_ctx, _req| async move {
            explode()
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::Internal);
    assert_eq!(err.metadata().get(ERROR_CODE_KEY).unwrap(), "INTERNAL");
    assert_eq!(c.metrics().request_count("tenant-a"), 1);
    assert_eq!(c.metrics().open_connections("tenant-a"), 0);
}

#[tokio::test]
async fn abandoned_call_releases_gauge() {
    let c = chain(&["tenant-a"]);
    let call = c.unary(CallMeta::new(METHOD, None), request_as(Some("tenant-a"), "n"), |_ctx, _req| async move {
        std::future::pending::<Result<HelloReply, Status>>().await
    });

    let res = tokio::time::timeout(Duration::from_millis(20), call).await;
    assert!(res.is_err());
    assert_eq!(c.metrics().request_count("tenant-a"), 1);
    assert_eq!(c.metrics().open_connections("tenant-a"), 0);
}

#[tokio::test]
async fn wildcard_policy_admits_anyone() {
    let c = chain(&["*"]);
    let resp = c
        .unary(CallMeta::new(METHOD, None), request_as(Some("tenant-zzz"), "n"), |ctx, req| async move {
            assert_eq!(ctx.tenant_id(), "tenant-zzz");
            echo(&req.name)
        })
        .await
        .unwrap();
    assert_eq!(resp.get_ref().message, "Hello n");
}
