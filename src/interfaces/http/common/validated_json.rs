//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value. Both kinds
//! of failure answer HTTP 400 with OCPI status 2001.

use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{status, OcpiResponse};

pub struct ValidatedJson<T>(pub T);

/// Error type for `ValidatedJson` extraction failures.
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    /// Body is not JSON of the expected shape.
    JsonError(String),
    /// Validation failed.
    ValidationError(validator::ValidationErrors),
}

impl ValidatedJsonRejection {
    pub fn message(&self) -> String {
        match self {
            Self::JsonError(e) => format!("Invalid JSON: {}", e),
            Self::ValidationError(errors) => {
                let mut field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errs)| {
                        errs.iter().map(move |e| {
                            let msg = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            format!("{}: {}", field, msg)
                        })
                    })
                    .collect();
                // Nested structs (the token inside START_SESSION) report here
                for (field, kind) in errors.errors() {
                    if let validator::ValidationErrorsKind::Struct(inner) = kind {
                        field_errors.push(format!("{}: {}", field, inner));
                    }
                }
                field_errors.sort();

                if field_errors.is_empty() {
                    "Validation failed".to_string()
                } else {
                    field_errors.join("; ")
                }
            }
        }
    }
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        let body = OcpiResponse::<()>::error(status::INVALID_PARAMETERS, self.message());
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Deserialize and validate a raw body whose type is only known after
/// routing, as with the command endpoint.
pub fn parse_validated<T>(body: &[u8]) -> Result<T, ValidatedJsonRejection>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_slice(body)
        .map_err(|e| ValidatedJsonRejection::JsonError(e.to_string()))?;
    value
        .validate()
        .map_err(ValidatedJsonRejection::ValidationError)?;
    Ok(value)
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidatedJsonRejection::JsonError(rejection.body_text()))?;

        value
            .validate()
            .map_err(ValidatedJsonRejection::ValidationError)?;

        Ok(ValidatedJson(value))
    }
}
