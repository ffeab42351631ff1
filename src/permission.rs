//! Asking the remote service for permission decisions.

use crate::client::Error;
use async_trait::async_trait;

/// A permission check, as sent to the remote service.
///
/// The request owns its data. Once created, changes to the caller's buffers no longer affect it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionCheckRequest {
    pub user_key: String,
    pub organization_name: String,
    pub permission_names: Vec<String>,
}

impl PermissionCheckRequest {
    pub fn new<I, S>(user_key: &str, organization_name: &str, permission_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_key: user_key.to_string(),
            organization_name: organization_name.to_string(),
            permission_names: permission_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ask: may this user perform these actions in this organization?
///
/// How multiple permissions get combined is up to the remote service. An `Err` does not mean
/// "forbidden", it means there is no decision.
#[async_trait]
pub trait PermissionQuery: Send + Sync {
    async fn check(
        &self,
        user_key: &str,
        organization_name: &str,
        permission_names: &[String],
    ) -> Result<bool, Error>;
}
