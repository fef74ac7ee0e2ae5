use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::error;

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// Frontera de errores: todo fallo acaba como `{"error": ...}` con su código.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DomainError::DetectionFailed(_)
            | DomainError::ImageUnreadable(_)
            | DomainError::DetectionTimeout
            | DomainError::ResultMissing
            | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "petición fallida");
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError(DomainError::BadRequest("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(DomainError::NotFound("x".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError(DomainError::DetectionTimeout).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError(DomainError::ResultMissing).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError(DomainError::PayloadTooLarge("x".into())).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let internal = DomainError::Internal(anyhow::anyhow!("disk full").context("writing upload"));
        assert_eq!(ApiError(internal).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
