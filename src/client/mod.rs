//! Connecting to the remote permission service.

mod config;
mod error;
pub mod grpc;
mod transport;

pub use config::*;
pub use error::*;
pub use transport::*;

use crate::permission::{PermissionCheckRequest, PermissionQuery};
use async_trait::async_trait;
use grpc::GrpcTransport;
use std::{fmt, future::Future, sync::Arc, time::Duration};

/// A client to the permission service.
///
/// A client can only be obtained through [`Client::connect`] or [`Client::connect_with`], which
/// verify the health of the remote service first. Cloning is cheap, all clones share the same
/// connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    config: ConnectionConfig,
    context: CallContext,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("closed", &self.inner.transport.is_closed())
            .finish()
    }
}

impl Client {
    /// Connect to the permission service over gRPC and verify it is serving.
    #[tracing::instrument(skip_all, fields(endpoint = config.get_endpoint()), err)]
    pub async fn connect(config: ConnectionConfig) -> Result<Self, Error> {
        let timeout = config.get_timeout();
        with_deadline(timeout, async move {
            let context = call_context(&config)?;
            let transport = GrpcTransport::connect(&config).await?;
            Self::verify(config, context, transport).await
        })
        .await
    }

    /// Create a client on top of an existing transport, verifying the remote service is serving.
    pub async fn connect_with<T>(config: ConnectionConfig, transport: T) -> Result<Self, Error>
    where
        T: Transport + 'static,
    {
        let timeout = config.get_timeout();
        with_deadline(timeout, async move {
            let context = call_context(&config)?;
            Self::verify(config, context, transport).await
        })
        .await
    }

    async fn verify<T>(
        config: ConnectionConfig,
        context: CallContext,
        transport: T,
    ) -> Result<Self, Error>
    where
        T: Transport + 'static,
    {
        let status = match transport.health(&context).await {
            Ok(status) => status,
            Err(err) => {
                transport.close();
                return Err(Error::Connect(err));
            }
        };

        if status != ServingStatus::Serving {
            log::info!(
                "Permission service at {} is not serving: {status}",
                config.get_endpoint()
            );
            transport.close();
            return Err(Error::Unhealthy(status));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                context,
                transport: Box::new(transport),
            }),
        })
    }

    /// The configuration this client was created from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Release the connection.
    ///
    /// The connection is shared by all clones of this client. Closing an already closed client
    /// has no effect.
    pub fn close(&self) {
        self.inner.transport.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.transport.is_closed()
    }

    /// Ask whether `user_key` holds `permission_names` in `organization_name`.
    ///
    /// The permission names are copied before the call, in the order given.
    pub async fn check<I, S>(
        &self,
        user_key: &str,
        organization_name: &str,
        permission_names: I,
    ) -> Result<bool, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let request = PermissionCheckRequest::new(
            user_key,
            organization_name,
            permission_names
                .into_iter()
                .map(|name| name.as_ref().to_string()),
        );
        self.check_request(request).await
    }

    #[tracing::instrument(skip(self), err)]
    async fn check_request(&self, request: PermissionCheckRequest) -> Result<bool, Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        log::debug!(
            "Check - user: {}, organization: {}, permissions: {:?}",
            request.user_key,
            request.organization_name,
            request.permission_names
        );

        let result = self
            .inner
            .transport
            .check(&self.inner.context, request)
            .await?;

        log::debug!("Check result: {result}");

        Ok(result)
    }
}

#[async_trait]
impl PermissionQuery for Client {
    async fn check(
        &self,
        user_key: &str,
        organization_name: &str,
        permission_names: &[String],
    ) -> Result<bool, Error> {
        Client::check(self, user_key, organization_name, permission_names).await
    }
}

fn call_context(config: &ConnectionConfig) -> Result<CallContext, Error> {
    if let Some(authorization) = config.authorization() {
        http::HeaderValue::from_str(authorization)
            .map_err(|err| Error::InvalidCredential(err.to_string()))?;
    }

    Ok(CallContext {
        authorization: config.authorization().map(ToString::to_string),
    })
}

async fn with_deadline<F>(timeout: Option<Duration>, f: F) -> Result<Client, Error>
where
    F: Future<Output = Result<Client, Error>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, f)
            .await
            .map_err(|_| Error::Timeout(timeout))?,
        None => f.await,
    }
}
