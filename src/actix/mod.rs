//! Actix-web integration.

pub mod auth;
