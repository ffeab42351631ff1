use serde::Deserialize;
use std::{fmt, sync::Arc, time::Duration};
use tonic::transport::Endpoint;

/// The endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "localhost:6565";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

/// An opaque transport directive, applied to the [`Endpoint`] before connecting.
#[derive(Clone)]
pub struct TransportOption(Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>);

impl TransportOption {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Endpoint) -> Endpoint + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, endpoint: Endpoint) -> Endpoint {
        (self.0)(endpoint)
    }
}

impl fmt::Debug for TransportOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransportOption(..)")
    }
}

/// Connection settings for a [`Client`](super::Client).
///
/// The [`Default`] value is the baseline: `localhost:6565`, no credential, no transport options
/// and no deadline. Each builder method changes exactly one concern. Setting the endpoint, the
/// credential or the timeout twice keeps the last value, transport options accumulate in the
/// order they were added.
///
/// ```
/// use rbns_sdk::client::{ConnectionConfig, TransportOption};
/// use std::time::Duration;
///
/// let config = ConnectionConfig::default()
///     .endpoint("rbns.example.com:6565")
///     .api_key("my-api-key")
///     .transport_option(TransportOption::new(|e| e.tcp_nodelay(true)))
///     .timeout(Duration::from_secs(5));
///
/// assert_eq!(config.authorization(), Some("Bearer my-api-key"));
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_endpoint")]
    endpoint: String,

    #[serde(default, rename = "api_key", deserialize_with = "deserialize_api_key")]
    authorization: Option<String>,

    #[serde(default, with = "humantime_serde")]
    timeout: Option<Duration>,

    #[serde(skip)]
    transport_options: Vec<TransportOption>,
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(bearer))
}

fn bearer(token: String) -> String {
    format!("Bearer {token}")
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            authorization: None,
            timeout: None,
            transport_options: Vec::new(),
        }
    }
}

impl ConnectionConfig {
    /// Override the target endpoint, in `host:port` form.
    ///
    /// The value is not validated here, a malformed endpoint surfaces when connecting.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the API key, sent as a bearer token with every call.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.authorization = Some(bearer(api_key.into()));
        self
    }

    /// Append a transport option.
    pub fn transport_option(mut self, option: TransportOption) -> Self {
        self.transport_options.push(option);
        self
    }

    /// Append multiple transport options.
    pub fn transport_options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = TransportOption>,
    {
        self.transport_options.extend(options);
        self
    }

    /// Bound the time spent connecting and probing the remote service.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The value of the `authorization` header, if a credential is set.
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_transport_options(&self) -> &[TransportOption] {
        &self.transport_options
    }

    /// The URI to dial. A bare `host:port` is dialled over plain HTTP/2.
    pub(crate) fn uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}
