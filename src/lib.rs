//! Client and HTTP authorization middleware for the RBNS permission service.
//!
//! A [`Client`](client::Client) connects to the permission service, verifies its health and then
//! answers permission checks through the [`PermissionQuery`](permission::PermissionQuery) trait.
//! The middleware in [`auth::authz`] threads such checks through HTTP request pipelines, with
//! bindings for actix-web and axum.

#[cfg(feature = "actix")]
pub mod actix;
pub mod auth;
#[cfg(feature = "axum")]
pub mod axum;
pub mod client;
pub mod core;
pub mod permission;

#[cfg(test)]
mod testing;

#[doc(hidden)]
pub mod prelude {
    pub use crate::auth::authz::Subject;
    pub use crate::client::{Client, ConnectionConfig};
    pub use crate::permission::PermissionQuery;
}
