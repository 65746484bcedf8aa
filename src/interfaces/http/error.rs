//! Mapping of bridge errors onto the OCPI envelope

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use super::common::{status, OcpiResponse};
use crate::shared::errors::BridgeError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Unknown token: {0}")]
    UnknownToken(String),
}

impl ApiError {
    fn status(&self) -> (StatusCode, u16) {
        match self {
            Self::UnknownToken(_) => (StatusCode::NOT_FOUND, status::UNKNOWN_TOKEN),
            Self::Bridge(e) => match e {
                BridgeError::MalformedEvseId(_) | BridgeError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, status::INVALID_PARAMETERS)
                }
                BridgeError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, status::CLIENT_ERROR),
                BridgeError::UnknownChargeStation(_)
                | BridgeError::DispatchFailure(_)
                | BridgeError::InvalidCall(_)
                | BridgeError::UnknownSession(_) => (StatusCode::OK, status::CLIENT_ERROR),
                BridgeError::Config(_) | BridgeError::Store(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, status::SERVER_ERROR)
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (http_status, ocpi_status) = self.status();
        if http_status.is_server_error() {
            error!(error = %self, "OCPI request failed");
        }
        let body = OcpiResponse::<()>::error(ocpi_status, self.to_string());
        (http_status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::StoreError;

    fn status_of(err: impl Into<ApiError>) -> (StatusCode, u16) {
        err.into().status()
    }

    #[test]
    fn maps_errors_to_ocpi_codes() {
        assert_eq!(
            status_of(BridgeError::MalformedEvseId("x".into())),
            (StatusCode::BAD_REQUEST, 2001)
        );
        assert_eq!(
            status_of(BridgeError::Unauthorized("x".into())),
            (StatusCode::UNAUTHORIZED, 2000)
        );
        assert_eq!(
            status_of(BridgeError::Store(StoreError::Timeout)),
            (StatusCode::INTERNAL_SERVER_ERROR, 3000)
        );
        assert_eq!(
            status_of(ApiError::UnknownToken("uid".into())),
            (StatusCode::NOT_FOUND, 2004)
        );
    }

    #[tokio::test]
    async fn response_carries_envelope() {
        let resp = ApiError::from(BridgeError::Validation("uid mismatch".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status_code"], 2001);
        assert_eq!(body["status_message"], "Validation: uid mismatch");
    }
}
