//! Authorization tooling.

pub mod authz;
mod error;

pub use error::*;
