//! A simulated permission service.

use crate::client::{CallContext, ServingStatus, Transport, TransportError};
use crate::permission::PermissionCheckRequest;
use async_trait::async_trait;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// Grants are stored per (user, organization, permission). A check is allowed when all
/// requested permissions are granted, organizations without any grant deny everything.
pub struct MockService {
    status: ServingStatus,
    grants: HashSet<(String, String, String)>,
    unreachable: bool,
    failing_checks: bool,
    latency: Option<Duration>,
    closed: AtomicBool,
    health_calls: AtomicUsize,
    health_authorization: Mutex<Option<String>>,
    requests: Mutex<Vec<(CallContext, PermissionCheckRequest)>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            status: ServingStatus::Serving,
            grants: HashSet::new(),
            unreachable: false,
            failing_checks: false,
            latency: None,
            closed: AtomicBool::new(false),
            health_calls: AtomicUsize::new(0),
            health_authorization: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn grant<I, S>(mut self, user_key: &str, organization_name: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for permission in permissions {
            self.grants.insert((
                user_key.to_string(),
                organization_name.to_string(),
                permission.into(),
            ));
        }
        self
    }

    pub fn status(mut self, status: ServingStatus) -> Self {
        self.status = status;
        self
    }

    /// Fail every call, including the liveness probe.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Fail permission checks, but report to be serving.
    pub fn failing_checks(mut self) -> Self {
        self.failing_checks = true;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn health_authorization(&self) -> Option<String> {
        self.health_authorization.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<(CallContext, PermissionCheckRequest)> {
        self.requests.lock().unwrap().clone()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl Transport for MockService {
    async fn health(&self, context: &CallContext) -> Result<ServingStatus, TransportError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        *self.health_authorization.lock().unwrap() = context.authorization.clone();
        self.delay().await;

        if self.unreachable {
            return Err(TransportError::new("Unavailable: connection refused"));
        }
        Ok(self.status)
    }

    async fn check(
        &self,
        context: &CallContext,
        request: PermissionCheckRequest,
    ) -> Result<bool, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((context.clone(), request.clone()));
        self.delay().await;

        if self.unreachable || self.failing_checks {
            return Err(TransportError::new("Unavailable: connection reset"));
        }

        let allowed = !request.permission_names.is_empty()
            && request.permission_names.iter().all(|permission| {
                self.grants.contains(&(
                    request.user_key.clone(),
                    request.organization_name.clone(),
                    permission.clone(),
                ))
            });
        Ok(allowed)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
