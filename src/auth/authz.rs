//! Framework independent authorization middleware.
//!
//! A host framework binding needs three things: request scoped storage (see [`RequestScope`]),
//! a way to abort the request with an [`AuthError`], and a way to continue with the next handler.
//! The bindings in this crate only translate between the framework and the types of this module.

use crate::auth::AuthError;
use crate::client::{Client, ConnectionConfig};
use crate::permission::PermissionQuery;
use std::{error::Error as StdError, fmt, sync::Arc};

/// Name of the request scoped slot holding the [`Client`].
pub const CLIENT_KEY: &str = "rbns-client/v1.0.0";

/// The acting user, in the context of an organization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    pub user_key: String,
    pub organization_name: String,
}

impl Subject {
    pub fn new(user_key: impl Into<String>, organization_name: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            organization_name: organization_name.into(),
        }
    }
}

/// The value stored in the request scoped storage.
#[derive(Clone, Debug)]
pub struct ClientSlot(pub Client);

/// Request scoped storage of a host framework.
pub trait RequestScope {
    fn client(&self) -> Option<Client>;

    fn set_client(&mut self, client: Client);
}

impl<B> RequestScope for http::Request<B> {
    fn client(&self) -> Option<Client> {
        self.extensions()
            .get::<ClientSlot>()
            .map(|slot| slot.0.clone())
    }

    fn set_client(&mut self, client: Client) {
        self.extensions_mut().insert(ClientSlot(client));
    }
}

/// Where the client for a request comes from.
#[derive(Clone, Debug)]
pub enum ClientSource {
    /// One client, shared by all requests.
    Shared(Client),
    /// A new client is connected for every request.
    ///
    /// This runs a full connect and health check as part of each request. Prefer
    /// [`ClientSource::Shared`] unless there is a reason not to.
    PerRequest(ConnectionConfig),
}

impl ClientSource {
    pub async fn resolve(&self) -> Result<Client, AuthError> {
        match self {
            Self::Shared(client) => Ok(client.clone()),
            Self::PerRequest(config) => Client::connect(config.clone()).await.map_err(|err| {
                log::info!("Failed to create permission client: {err}");
                AuthError::Internal(err)
            }),
        }
    }
}

/// The original error of a failed subject extraction.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The outcome of authorizing a single request.
#[derive(Debug)]
pub enum Decision {
    Allowed,
    Forbidden,
    UpstreamError(crate::client::Error),
    ExtractionError(BoxError),
    MissingClient,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden => Err(AuthError::Forbidden),
            Self::UpstreamError(err) => Err(AuthError::Upstream(err)),
            Self::ExtractionError(err) => Err(AuthError::Extraction(err)),
            Self::MissingClient => Err(AuthError::MissingClient),
        }
    }
}

/// Finds the subject of a request `R`.
pub type SubjectExtractor<R> = dyn Fn(&R) -> Result<Subject, BoxError> + Send + Sync;

/// Checks that the subject of a request holds a set of permissions.
pub struct PermissionCheck<R> {
    extractor: Arc<SubjectExtractor<R>>,
    permissions: Arc<[String]>,
}

impl<R> Clone for PermissionCheck<R> {
    fn clone(&self) -> Self {
        Self {
            extractor: self.extractor.clone(),
            permissions: self.permissions.clone(),
        }
    }
}

impl<R> fmt::Debug for PermissionCheck<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionCheck")
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl<R> PermissionCheck<R> {
    /// Create a new check, using `extractor` to find the subject of a request.
    pub fn new<F, E, I, S>(extractor: F, permissions: I) -> Self
    where
        F: Fn(&R) -> Result<Subject, E> + Send + Sync + 'static,
        E: Into<BoxError>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extractor: Arc::new(move |request: &R| extractor(request).map_err(Into::into)),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Read everything required for the decision from the request.
    pub fn prepare(&self, request: &R) -> (Option<Client>, Result<Subject, BoxError>)
    where
        R: RequestScope,
    {
        let client = request.client();
        let subject = (self.extractor)(request);
        (client, subject)
    }

    /// Decide on a request.
    ///
    /// If the subject could not be extracted, the permission service is not asked.
    pub async fn evaluate<Q>(
        &self,
        client: Option<&Q>,
        subject: Result<Subject, BoxError>,
    ) -> Decision
    where
        Q: PermissionQuery + ?Sized,
    {
        let subject = match subject {
            Ok(subject) => subject,
            Err(err) => {
                log::debug!("Unable to extract subject: {err}");
                return Decision::ExtractionError(err);
            }
        };

        let client = match client {
            Some(client) => client,
            None => {
                log::debug!("No permission client found in request ({CLIENT_KEY})");
                return Decision::MissingClient;
            }
        };

        log::debug!(
            "Authorizing - user: {}, organization: {}, permissions: {:?}",
            subject.user_key,
            subject.organization_name,
            self.permissions
        );

        let decision = match client
            .check(
                &subject.user_key,
                &subject.organization_name,
                &self.permissions,
            )
            .await
        {
            Ok(true) => Decision::Allowed,
            Ok(false) => Decision::Forbidden,
            Err(err) => Decision::UpstreamError(err),
        };

        log::debug!("Outcome: {:?}", decision);

        decision
    }
}
