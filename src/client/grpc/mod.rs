//! gRPC transport, based on `tonic`.

pub mod proto;

use super::{CallContext, ConnectionConfig, Error, ServingStatus, Transport, TransportError};
use crate::permission::PermissionCheckRequest;
use async_trait::async_trait;
use proto::permission_client::PermissionClient;
use std::sync::{PoisonError, RwLock};
use tonic::{
    metadata::AsciiMetadataValue,
    transport::{Channel, Endpoint},
};
use tonic_health::pb::{
    health_check_response::ServingStatus as HealthStatus, health_client::HealthClient,
    HealthCheckRequest,
};

/// A transport over a single `tonic` channel.
#[derive(Debug)]
pub struct GrpcTransport {
    channel: RwLock<Option<Channel>>,
}

impl GrpcTransport {
    /// Open a channel to the configured endpoint, applying all transport options in order.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, Error> {
        let endpoint = Endpoint::from_shared(config.uri()).map_err(|err| {
            Error::InvalidEndpoint(config.get_endpoint().to_string(), err.to_string())
        })?;
        let endpoint = config
            .get_transport_options()
            .iter()
            .fold(endpoint, |endpoint, option| option.apply(endpoint));

        log::debug!("Connecting to {}", config.get_endpoint());

        let channel = endpoint
            .connect()
            .await
            .map_err(|err| Error::Connect(err.into()))?;

        Ok(Self::new(channel))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            channel: RwLock::new(Some(channel)),
        }
    }

    fn channel(&self) -> Result<Channel, TransportError> {
        self.channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| TransportError::new("connection closed"))
    }
}

fn request<T>(context: &CallContext, message: T) -> Result<tonic::Request<T>, TransportError> {
    let mut request = tonic::Request::new(message);
    if let Some(authorization) = &context.authorization {
        let value: AsciiMetadataValue = authorization
            .parse()
            .map_err(|_| TransportError::new("invalid authorization metadata"))?;
        request.metadata_mut().insert("authorization", value);
    }
    Ok(request)
}

impl From<HealthStatus> for ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Unknown => Self::Unknown,
            HealthStatus::Serving => Self::Serving,
            HealthStatus::NotServing => Self::NotServing,
            HealthStatus::ServiceUnknown => Self::ServiceUnknown,
        }
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn health(&self, context: &CallContext) -> Result<ServingStatus, TransportError> {
        let request = request(
            context,
            HealthCheckRequest {
                service: String::new(),
            },
        )?;
        let response = HealthClient::new(self.channel()?).check(request).await?;
        Ok(response.into_inner().status().into())
    }

    async fn check(
        &self,
        context: &CallContext,
        request: PermissionCheckRequest,
    ) -> Result<bool, TransportError> {
        let request = self::request(
            context,
            proto::PermissionCheckRequest {
                user_key: request.user_key,
                organization_name: request.organization_name,
                permission_names: request.permission_names,
            },
        )?;
        let response = PermissionClient::new(self.channel()?)
            .check(request)
            .await?;
        Ok(response.into_inner().result)
    }

    fn close(&self) {
        // dropping the last clone of the channel shuts down the connection
        self.channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn is_closed(&self) -> bool {
        self.channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::client::Client;
    use proto::{
        permission_server::{Permission, PermissionServer},
        PermissionCheckResult,
    };
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::transport::Server;

    /// Records what reaches the server, and allows `user1` only.
    #[derive(Default)]
    struct RecordingPermissions {
        received: Mutex<Vec<(Option<String>, proto::PermissionCheckRequest)>>,
    }

    #[tonic::async_trait]
    impl Permission for Arc<RecordingPermissions> {
        async fn check(
            &self,
            request: tonic::Request<proto::PermissionCheckRequest>,
        ) -> Result<tonic::Response<PermissionCheckResult>, tonic::Status> {
            let authorization = request
                .metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            let request = request.into_inner();
            let result = request.user_key == "user1";

            self.received
                .lock()
                .unwrap()
                .push((authorization, request));

            Ok(tonic::Response::new(PermissionCheckResult { result }))
        }
    }

    async fn serve(
        status: tonic_health::ServingStatus,
        permissions: Arc<RecordingPermissions>,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (reporter, health) = tonic_health::server::health_reporter();
        reporter.set_service_status("", status).await;

        tokio::spawn(
            Server::builder()
                .add_service(health)
                .add_service(PermissionServer::new(permissions))
                .serve_with_incoming(TcpListenerStream::new(listener)),
        );

        addr.to_string()
    }

    #[tokio::test]
    async fn test_check_over_grpc() {
        let permissions = Arc::new(RecordingPermissions::default());
        let endpoint = serve(tonic_health::ServingStatus::Serving, permissions.clone()).await;

        let config = ConnectionConfig::default()
            .endpoint(endpoint)
            .api_key("5d78ced0");
        let client = Client::connect(config).await.unwrap();

        assert!(client
            .check("user1", "default", ["read:test", "create:test", "delete:test"])
            .await
            .unwrap());
        assert!(!client
            .check("user2", "default", ["read:test"])
            .await
            .unwrap());

        let received = permissions.received.lock().unwrap().clone();
        assert_eq!(received.len(), 2);

        let (authorization, request) = &received[0];
        assert_eq!(authorization.as_deref(), Some("Bearer 5d78ced0"));
        assert_eq!(
            request,
            &proto::PermissionCheckRequest {
                user_key: "user1".into(),
                organization_name: "default".into(),
                permission_names: vec![
                    "read:test".into(),
                    "create:test".into(),
                    "delete:test".into()
                ],
            }
        );
        assert_eq!(received[1].0.as_deref(), Some("Bearer 5d78ced0"));

        client.close();
    }

    #[tokio::test]
    async fn test_connect_not_serving_over_grpc() {
        let permissions = Arc::new(RecordingPermissions::default());
        let endpoint = serve(tonic_health::ServingStatus::NotServing, permissions.clone()).await;

        let result = Client::connect(ConnectionConfig::default().endpoint(endpoint)).await;

        assert!(matches!(
            result,
            Err(Error::Unhealthy(ServingStatus::NotServing))
        ));
        assert!(permissions.received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_request_metadata() {
        let context = CallContext {
            authorization: Some("Bearer my-key".to_string()),
        };
        let request = request(&context, ()).unwrap();

        assert_eq!(
            request
                .metadata()
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer my-key")
        );
    }

    #[test]
    fn test_request_without_credential() {
        let request = request(&CallContext::default(), ()).unwrap();
        assert!(request.metadata().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // nothing listens on port 1
        let config = ConnectionConfig::default().endpoint("127.0.0.1:1");
        let result = GrpcTransport::connect(&config).await;

        assert!(matches!(result, Err(Error::Connect(_))));
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let config = ConnectionConfig::default().endpoint("not a host");
        let result = GrpcTransport::connect(&config).await;

        assert!(matches!(result, Err(Error::InvalidEndpoint(..))));
    }

    #[tokio::test]
    async fn test_close_twice() {
        let channel = Endpoint::from_static("http://127.0.0.1:1").connect_lazy();
        let transport = GrpcTransport::new(channel);

        assert!(!transport.is_closed());
        transport.close();
        transport.close();
        assert!(transport.is_closed());

        let result = transport.health(&CallContext::default()).await;
        assert_eq!(result, Err(TransportError::new("connection closed")));
    }
}
