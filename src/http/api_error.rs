// JSON envelope for every response, plus the mapping from core errors to
// status codes the dashboard UI branches on.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core::credentials::CredentialError;
use crate::core::google_ads::{AdsError, SessionError};
use crate::core::hierarchy::HierarchyError;
use crate::core::insights::InsightError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

#[derive(Debug)]
pub struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) code: &'static str,
    message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, "Request failed: {}", self.message);
        }
        let body = ErrorBody {
            success: false,
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

/// `Json` body extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        let (status, code) = match &err {
            CredentialError::NotConfigured => (StatusCode::PRECONDITION_FAILED, "NOT_CONFIGURED"),
            CredentialError::ReauthRequired(_) => (StatusCode::UNAUTHORIZED, "REAUTH_REQUIRED"),
            CredentialError::Invalid(_) => (StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS"),
            CredentialError::OAuth(_) => (StatusCode::BAD_GATEWAY, "OAUTH_ERROR"),
            CredentialError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl From<AdsError> for ApiError {
    fn from(err: AdsError) -> Self {
        let (status, code) = match &err {
            AdsError::InvalidCustomerId(_) => (StatusCode::BAD_REQUEST, "INVALID_CUSTOMER_ID"),
            AdsError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AdsError::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            AdsError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "REAUTH_REQUIRED"),
            AdsError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AdsError::Api { .. } | AdsError::Transport(_) | AdsError::InvalidResponse(_) => {
                (StatusCode::BAD_GATEWAY, "GOOGLE_ADS_ERROR")
            }
        };
        ApiError::new(status, code, err.to_string())
    }
}

impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::Ads(ads) => ads.into(),
            HierarchyError::NoAccessPath(_) => {
                ApiError::new(StatusCode::FORBIDDEN, "NO_ACCESS_PATH", err.to_string())
            }
            HierarchyError::InvariantViolation { .. } => {
                ApiError::new(StatusCode::BAD_GATEWAY, "INVALID_HIERARCHY", err.to_string())
            }
            HierarchyError::Storage(_) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                err.to_string(),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Credentials(e) => e.into(),
            SessionError::Ads(e) => e.into(),
            SessionError::Hierarchy(e) => e.into(),
            SessionError::MissingCustomerId => ApiError::new(
                StatusCode::BAD_REQUEST,
                "MISSING_CUSTOMER_ID",
                err.to_string(),
            ),
        }
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::UnknownKind(_) => {
                ApiError::new(StatusCode::NOT_FOUND, "UNKNOWN_INSIGHT", err.to_string())
            }
            InsightError::Provider(_) | InsightError::Parse(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, "AI_ERROR", err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_map_to_ui_codes() {
        let err = ApiError::from(CredentialError::NotConfigured);
        assert_eq!(err.status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(err.code, "NOT_CONFIGURED");

        let err = ApiError::from(CredentialError::ReauthRequired("invalid_grant".into()));
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "REAUTH_REQUIRED");
    }

    #[test]
    fn session_errors_unwrap_to_their_source() {
        let err = ApiError::from(SessionError::Ads(AdsError::PermissionDenied("nope".into())));
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = ApiError::from(SessionError::Hierarchy(HierarchyError::Ads(AdsError::Api {
            status: 500,
            message: "boom".into(),
        })));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        let err = ApiError::from(SessionError::MissingCustomerId);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "MISSING_CUSTOMER_ID");
    }

    #[test]
    fn storage_failures_are_internal_errors() {
        let err = ApiError::from(HierarchyError::Storage("disk full".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "STORAGE_ERROR");
    }
}
