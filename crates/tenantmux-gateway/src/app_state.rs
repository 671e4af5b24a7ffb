//! Shared application state.
//!
//! Built once at startup. The policy is immutable from here on; the metrics
//! are the only shared mutable state and are passed by handle, never global.

use std::sync::Arc;

use tenantmux_core::policy::TenantPolicy;

use crate::interceptor::InterceptorChain;
use crate::obs::TenantMetrics;
use crate::rpc::ReplyBuilder;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    chain: InterceptorChain,
    reply_builder: Arc<dyn ReplyBuilder>,
}

impl AppState {
    pub fn new(policy: TenantPolicy, reply_builder: Arc<dyn ReplyBuilder>) -> Self {
        let metrics = Arc::new(TenantMetrics::new());
        let chain = InterceptorChain::new(Arc::new(policy), metrics);
        Self {
            inner: Arc::new(AppStateInner { chain, reply_builder }),
        }
    }

    pub fn chain(&self) -> &InterceptorChain {
        &self.inner.chain
    }

    pub fn policy(&self) -> &TenantPolicy {
        self.inner.chain.policy()
    }

    pub fn metrics(&self) -> &Arc<TenantMetrics> {
        self.inner.chain.metrics()
    }

    pub fn reply_builder(&self) -> Arc<dyn ReplyBuilder> {
        Arc::clone(&self.inner.reply_builder)
    }
}
