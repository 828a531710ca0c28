use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The application-wide failure taxonomy. Every fallible endpoint returns this type,
/// so status mapping and response shape are decided in exactly one place:
/// 400 for user-correctable input, 401 for credential failures, 403 for authorization
/// denials, 404 for missing entities, 500 for anything the persistence layer or an
/// external collaborator throws at us.
///
/// Authorization denials never degrade into partial results; they surface here as
/// `Forbidden`. Credential failures (missing, expired, forged) are collapsed into
/// `Unauthenticated` before reaching the client; the distinction is kept in logs only.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field was missing, blank, or otherwise rejected at the boundary.
    #[error("{0}")]
    Validation(String),

    /// No usable credential accompanied the request.
    #[error("not authenticated")]
    Unauthenticated,

    /// The caller is authenticated but not permitted to perform the operation.
    #[error("not permitted")]
    Forbidden,

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Persistence-layer or unexpected failure. The detail is logged server-side and
    /// never included in the client-visible message.
    #[error("storage failure: {0}")]
    Store(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "not authenticated".to_string())
            }
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "not permitted".to_string()),
            ApiError::NotFound(entity) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ApiError::Store(detail) => {
                // Log the underlying failure, surface a generic message.
                tracing::error!("store failure: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
