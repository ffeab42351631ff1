use super::ServingStatus;
use std::time::Duration;

/// A failure of a single call, at the transport or serialization level.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<tonic::Status> for TransportError {
    fn from(status: tonic::Status) -> Self {
        Self(format!("{:?}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for TransportError {
    fn from(err: tonic::transport::Error) -> Self {
        Self(err.to_string())
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    /// The remote service could not be reached, or the liveness probe itself failed.
    #[error("Status RPC failure: {0}")]
    Connect(#[source] TransportError),
    /// The remote service is reachable, but does not report to be serving.
    #[error("Status unhealthy: {0}")]
    Unhealthy(ServingStatus),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// A call failed after the client was established.
    #[error("Transport: {0}")]
    Transport(#[from] TransportError),
    #[error("Client is closed")]
    Closed,
}
