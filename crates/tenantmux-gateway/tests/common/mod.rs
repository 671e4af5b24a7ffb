#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

use tenantmux_core::policy::{TenantMatchRule, TenantPolicy};
use tenantmux_gateway::context::{TenantContext, TENANT_HEADER};
use tenantmux_gateway::interceptor::InterceptorChain;
use tenantmux_gateway::obs::TenantMetrics;
use tenantmux_gateway::rpc::proto::{HelloReply, HelloRequest};
use tenantmux_gateway::rpc::ReplyBuilder;

pub fn exact_policy(allowed: &[&str]) -> TenantPolicy {
    TenantPolicy::new(
        vec![TenantMatchRule::Exact(allowed.iter().map(|s| s.to_string()).collect())],
        vec![],
    )
}

pub fn chain(allowed: &[&str]) -> InterceptorChain {
    InterceptorChain::new(Arc::new(exact_policy(allowed)), Arc::new(TenantMetrics::new()))
}

pub fn tenant_md(tenant: &str) -> MetadataMap {
    let mut md = MetadataMap::new();
    md.insert(TENANT_HEADER, tenant.parse().unwrap());
    md
}

pub fn hello(name: &str) -> HelloRequest {
    HelloRequest { name: name.to_string() }
}

pub fn request_as(tenant: Option<&str>, name: &str) -> Request<HelloRequest> {
    let mut req = Request::new(hello(name));
    if let Some(t) = tenant {
        req.metadata_mut().insert(TENANT_HEADER, t.parse().unwrap());
    }
    req
}

/// "Hello <name>" with no environment lookups.
pub struct EchoBuilder;

#[async_trait]
impl ReplyBuilder for EchoBuilder {
    async fn build_reply(&self, ctx: &TenantContext, req: &HelloRequest) -> Result<HelloReply, Status> {
        Ok(HelloReply {
            message: format!("Hello {}", req.name),
            tenant_id: ctx.tenant_id().to_string(),
            ..Default::default()
        })
    }
}

/// Panics on a request named "boom", echoes otherwise.
pub struct FragileBuilder;

#[async_trait]
impl ReplyBuilder for FragileBuilder {
    async fn build_reply(&self, ctx: &TenantContext, req: &HelloRequest) -> Result<HelloReply, Status> {
        if req.name == "boom" {
            panic!("reply builder exploded");
        }
        EchoBuilder.build_reply(ctx, req).await
    }
}
