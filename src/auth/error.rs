use crate::auth::authz::BoxError;
use crate::client;
use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Error body of a rejected request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInformation {
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The permission service denied the request.
    #[error("Forbidden")]
    Forbidden,
    /// The user or organization could not be determined from the request.
    #[error("Invalid request: {0}")]
    Extraction(#[source] BoxError),
    /// The permission check failed, there is no decision.
    #[error("Upstream: {0}")]
    Upstream(#[source] client::Error),
    /// No client was attached to the request.
    #[error("Missing authorization client")]
    MissingClient,
    /// The client could not be created.
    #[error("Internal: {0}")]
    Internal(#[source] client::Error),
}

impl AuthError {
    /// Everything but a failure to create the client is reported as forbidden, so that callers
    /// can't tell an unknown user from a denied one.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Forbidden | Self::Extraction(_) | Self::Upstream(_) | Self::MissingClient => {
                StatusCode::FORBIDDEN
            }
        }
    }

    pub fn error_information(&self) -> ErrorInformation {
        let error = match self {
            Self::Internal(_) => "Internal",
            _ => "Forbidden",
        };
        ErrorInformation {
            error: error.to_string(),
            message: self.to_string(),
        }
    }
}

#[cfg(feature = "actix")]
impl actix_web::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        // actix-web 4 is still on http 0.2
        actix_web::http::StatusCode::from_u16(AuthError::status_code(self).as_u16())
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse<actix_http::body::BoxBody> {
        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .json(self.error_information())
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), axum::Json(self.error_information())).into_response()
    }
}
