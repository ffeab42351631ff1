//! Authorization middleware for axum.
//!
//! The functions of this module are meant to be used with
//! [`from_fn_with_state`](::axum::middleware::from_fn_with_state):
//!
//! ```no_run
//! use axum::{extract::Request, middleware::from_fn_with_state, routing::post, Router};
//! use rbns_sdk::auth::authz::{ClientSource, Subject};
//! use rbns_sdk::axum::{attach_client, permission_check, PermissionCheck};
//! use rbns_sdk::client::{Client, ConnectionConfig};
//!
//! fn get_user(req: &Request) -> Result<Subject, String> {
//!     let user = req
//!         .headers()
//!         .get("X-User")
//!         .and_then(|v| v.to_str().ok())
//!         .ok_or("Missing user")?;
//!     Ok(Subject::new(user, "default"))
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::connect(ConnectionConfig::default()).await?;
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/api/users",
//!         post(|| async { "created" }).layer(from_fn_with_state(
//!             PermissionCheck::new(get_user, ["create:test"]),
//!             permission_check,
//!         )),
//!     )
//!     .layer(from_fn_with_state(ClientSource::Shared(client), attach_client));
//! # Ok(())
//! # }
//! ```

use crate::auth::authz::{self, ClientSource, RequestScope};
use ::axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub type PermissionCheck = authz::PermissionCheck<Request>;

/// Attach a client to the request.
pub async fn attach_client(
    State(source): State<ClientSource>,
    mut request: Request,
    next: Next,
) -> Response {
    match source.resolve().await {
        Ok(client) => {
            request.set_client(client);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Check the permissions of the request, using the client attached by [`attach_client`].
pub async fn permission_check(
    State(check): State<PermissionCheck>,
    request: Request,
    next: Next,
) -> Response {
    let (client, subject) = check.prepare(&request);

    match check.evaluate(client.as_ref(), subject).await.into_result() {
        Ok(()) => next.run(request).await,
        Err(err) => {
            log::info!("Rejecting request to {}: {err}", request.uri().path());
            err.into_response()
        }
    }
}

/// Attach a new client to the request and check its permissions in one step.
pub async fn permission_check_with_client(
    State((source, check)): State<(ClientSource, PermissionCheck)>,
    mut request: Request,
    next: Next,
) -> Response {
    match source.resolve().await {
        Ok(client) => request.set_client(client),
        Err(err) => return err.into_response(),
    }

    permission_check(State(check), request, next).await
}
