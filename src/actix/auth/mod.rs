//! Authorization middleware for actix-web.
//!
//! ```no_run
//! use actix_web::{dev::ServiceRequest, web, App, HttpResponse, HttpServer};
//! use rbns_sdk::actix::auth::{PermissionCheck, RbnsClient};
//! use rbns_sdk::auth::authz::Subject;
//! use rbns_sdk::client::{Client, ConnectionConfig};
//!
//! fn get_user(req: &ServiceRequest) -> Result<Subject, String> {
//!     let user = req
//!         .headers()
//!         .get("X-User")
//!         .and_then(|v| v.to_str().ok())
//!         .ok_or("Missing user")?;
//!     Ok(Subject::new(user, "default"))
//! }
//!
//! #[actix_web::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect(ConnectionConfig::default().api_key("my-api-key")).await?;
//!
//!     HttpServer::new(move || {
//!         App::new().wrap(RbnsClient::shared(client.clone())).service(
//!             web::resource("/api/users")
//!                 .wrap(PermissionCheck::new(get_user, ["create:test"]))
//!                 .route(web::post().to(HttpResponse::Ok)),
//!         )
//!     })
//!     .bind("127.0.0.1:8080")?
//!     .run()
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

mod middleware;

use crate::auth::authz::{self, BoxError, ClientSlot, ClientSource, RequestScope, Subject};
use crate::client::{Client, ConnectionConfig};
use actix_web::{dev::ServiceRequest, HttpMessage};

impl RequestScope for ServiceRequest {
    fn client(&self) -> Option<Client> {
        self.extensions()
            .get::<ClientSlot>()
            .map(|slot| slot.0.clone())
    }

    fn set_client(&mut self, client: Client) {
        self.extensions_mut().insert(ClientSlot(client));
    }
}

/// Attaches a [`Client`] to each request, for a later [`PermissionCheck`].
///
/// If the client can't be created, the request is rejected with `500 Internal Server Error`.
#[derive(Clone, Debug)]
pub struct RbnsClient {
    source: ClientSource,
}

impl RbnsClient {
    /// Attach an existing client.
    pub fn shared(client: Client) -> Self {
        Self {
            source: ClientSource::Shared(client),
        }
    }

    /// Connect a new client for every request.
    pub fn with_options(config: ConnectionConfig) -> Self {
        Self {
            source: ClientSource::PerRequest(config),
        }
    }
}

/// Checks the permissions of a request, rejecting it with `403 Forbidden` unless the permission
/// service allows it.
///
/// The user and organization are extracted from the request by a function provided by the
/// caller. If that fails, the request is rejected the same way as a denied one.
#[derive(Clone, Debug)]
pub struct PermissionCheck {
    source: Option<ClientSource>,
    check: authz::PermissionCheck<ServiceRequest>,
}

impl PermissionCheck {
    /// Check using the client attached by [`RbnsClient`].
    pub fn new<F, E, I, S>(extractor: F, permissions: I) -> Self
    where
        F: Fn(&ServiceRequest) -> Result<Subject, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: None,
            check: authz::PermissionCheck::new(extractor, permissions),
        }
    }

    /// Connect a new client for each request, and use it for the check.
    pub fn with_client_options<F, E, I, S>(
        extractor: F,
        permissions: I,
        config: ConnectionConfig,
    ) -> Self
    where
        F: Fn(&ServiceRequest) -> Result<Subject, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: Some(ClientSource::PerRequest(config)),
            check: authz::PermissionCheck::new(extractor, permissions),
        }
    }
}
