//! Tenant interceptor chain.
//!
//! Every unary call and every stream passes through the same stages, in this
//! order:
//!
//! 1. identity: read `x-tenant-id` (fails closed)
//! 2. accounting: take a [`ConnectionGuard`] on the tenant's gauge
//! 3. admission: evaluate the tenant policy
//! 4. logging
//! 5. the handler itself (unary only; streams hand off to the session loop)
//! 6. panic containment
//! 7. release: the guard drops on every exit path
//!
//! Accounting starts as soon as the tenant key is known, so a denied tenant
//! still shows up on the gauge for the duration of the rejection. A call with
//! no tenant key has nothing to account against.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Request, Response, Status};

use tenantmux_core::error::TenantMuxError;
use tenantmux_core::policy::TenantPolicy;

use crate::context::{extract_tenant_id, CallMeta, TenantContext};
use crate::obs::{ConnectionGuard, TenantMetrics};

/// Response metadata key carrying the stable error code.
pub const ERROR_CODE_KEY: &str = "x-tenantmux-error";

/// A call or stream that passed admission.
///
/// Owns the tenant's gauge unit; dropping it ends the accounting window.
#[derive(Debug)]
pub struct Admitted {
    ctx: TenantContext,
    _guard: ConnectionGuard,
}

impl Admitted {
    pub fn context(&self) -> &TenantContext {
        &self.ctx
    }
    pub fn tenant_id(&self) -> &str {
        self.ctx.tenant_id()
    }
}

/// Shared admission/metrics/logging pipeline. Cheap to clone.
#[derive(Clone)]
pub struct InterceptorChain {
    policy: Arc<TenantPolicy>,
    metrics: Arc<TenantMetrics>,
}

impl InterceptorChain {
    pub fn new(policy: Arc<TenantPolicy>, metrics: Arc<TenantMetrics>) -> Self {
        Self { policy, metrics }
    }

    pub fn policy(&self) -> &TenantPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<TenantMetrics> {
        &self.metrics
    }

    /// Stages 1-4. Runs exactly once per unary call or per stream.
    pub fn admit(&self, md: &MetadataMap, call: CallMeta) -> Result<Admitted, TenantMuxError> {
        let tenant_id = match extract_tenant_id(md) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(client_ip = %call.client_ip(), method = call.method, "rejected: missing tenant header");
                return Err(e);
            }
        };

        let guard = self.metrics.open_connection(&tenant_id);

        let eval = self.policy.evaluate(&tenant_id);
        if eval.deny_matched {
            tracing::debug!(tenant_id = %tenant_id, admitted = eval.admitted, "tenant matched a deny rule");
        }
        if !eval.admitted {
            tracing::warn!(client_ip = %call.client_ip(), tenant_id = %tenant_id, method = call.method, "rejected: tenant not allowed");
            // guard drops here, returning the gauge to where it was
            return Err(TenantMuxError::TenantDenied { tenant_id });
        }

        tracing::info!(client_ip = %call.client_ip(), tenant_id = %tenant_id, method = call.method, "call admitted");
        Ok(Admitted {
            ctx: TenantContext { tenant_id, call },
            _guard: guard,
        })
    }

    /// Run a unary handler inside the full chain.
    pub async fn unary<Req, Resp, F, Fut>(
        &self,
        call: CallMeta,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<Resp>, Status>
    where
        F: FnOnce(TenantContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, Status>>,
    {
        let admitted = self
            .admit(request.metadata(), call)
            .map_err(|e| status_from_error(&e))?;
        self.metrics.inc_requests(admitted.tenant_id());

        let ctx = admitted.context().clone();
        let req = request.into_inner();
        let outcome = AssertUnwindSafe(async move { handler(ctx, req).await })
            .catch_unwind()
            .await;

        let res = match outcome {
            Ok(Ok(resp)) => Ok(Response::new(resp)),
            Ok(Err(status)) => {
                tracing::warn!(tenant_id = %admitted.tenant_id(), code = ?status.code(), error = %status.message(), "handler failed");
                Err(status)
            }
            Err(panic) => {
                let msg = panic_message(panic.as_ref());
                tracing::error!(tenant_id = %admitted.tenant_id(), panic = %msg, "handler panicked");
                Err(status_from_error(&TenantMuxError::Internal(msg)))
            }
        };
        drop(admitted);
        res
    }
}

/// Convert a gateway error into the status the caller sees.
///
/// Both admission failures are `INVALID_ARGUMENT`; the message text and the
/// `x-tenantmux-error` metadata keep them apart.
pub fn status_from_error(err: &TenantMuxError) -> Status {
    let code = err.client_code();
    let mut status = match err {
        TenantMuxError::MissingTenantHeader | TenantMuxError::TenantDenied { .. } => {
            Status::invalid_argument(err.to_string())
        }
        TenantMuxError::StreamTransport(_) => Status::unavailable(err.to_string()),
        TenantMuxError::BadConfig(_) => Status::failed_precondition(err.to_string()),
        TenantMuxError::Internal(_) | TenantMuxError::ListenerFatal(_) => {
            Status::internal(err.to_string())
        }
    };
    status
        .metadata_mut()
        .insert(ERROR_CODE_KEY, MetadataValue::from_static(code.as_str()));
    status
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
