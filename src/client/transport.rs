use super::TransportError;
use crate::permission::PermissionCheckRequest;
use async_trait::async_trait;
use std::{fmt, sync::Arc};

/// Serving status, as reported by the liveness probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServingStatus {
    Unknown,
    Serving,
    NotServing,
    ServiceUnknown,
}

impl fmt::Display for ServingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "UNKNOWN",
            Self::Serving => "SERVING",
            Self::NotServing => "NOT_SERVING",
            Self::ServiceUnknown => "SERVICE_UNKNOWN",
        })
    }
}

/// State attached to every call made through a client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Value of the `authorization` header.
    pub authorization: Option<String>,
}

/// The connection to the remote permission service.
///
/// Implementations must allow concurrent calls through a shared reference.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Query the liveness of the remote service.
    async fn health(&self, context: &CallContext) -> Result<ServingStatus, TransportError>;

    /// Ask the remote service to decide on a permission check.
    async fn check(
        &self,
        context: &CallContext,
        request: PermissionCheckRequest,
    ) -> Result<bool, TransportError>;

    /// Release the connection. Calling this more than once has no effect.
    fn close(&self);

    fn is_closed(&self) -> bool;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn health(&self, context: &CallContext) -> Result<ServingStatus, TransportError> {
        (**self).health(context).await
    }

    async fn check(
        &self,
        context: &CallContext,
        request: PermissionCheckRequest,
    ) -> Result<bool, TransportError> {
        (**self).check(context, request).await
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
