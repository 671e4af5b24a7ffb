//! Reply construction for the greeter.
//!
//! The session loop and the unary handler only see the [`ReplyBuilder`]
//! trait; how the reply is filled in is up to the implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tonic::Status;

use crate::context::TenantContext;
use crate::environment::EnvironmentProbe;
use crate::rpc::proto::{HelloReply, HelloRequest};

#[async_trait]
pub trait ReplyBuilder: Send + Sync {
    async fn build_reply(&self, ctx: &TenantContext, req: &HelloRequest) -> Result<HelloReply, Status>;
}

/// "Hello <name>" plus the instance's environment descriptors.
pub struct GreetingBuilder {
    env: Arc<EnvironmentProbe>,
}

impl GreetingBuilder {
    pub fn new(env: Arc<EnvironmentProbe>) -> Self {
        Self { env }
    }
}

#[async_trait]
impl ReplyBuilder for GreetingBuilder {
    async fn build_reply(&self, ctx: &TenantContext, req: &HelloRequest) -> Result<HelloReply, Status> {
        let info = self.env.info().await;
        Ok(HelloReply {
            message: format!("Hello {}", req.name),
            version: info.version,
            hostname: info.hostname,
            tenant_id: ctx.tenant_id.clone(),
            zone: info.zone,
            nodename: info.nodename,
            region: info.region,
            clustername: info.clustername,
            project: info.project,
        })
    }
}
