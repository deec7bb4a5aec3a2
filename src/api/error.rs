use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{error, warn};
use wagate_core::error::GatewayError;

/// Message attached to each missing or empty field.
pub const INVALID_VALUE: &str = "Invalid value";

/// Failure of an API request.
#[derive(Debug)]
pub enum ApiError {
    /// Required fields missing or empty, keyed by field name.
    Validation(BTreeMap<&'static str, String>),
    /// The body could not be decoded at all.
    Malformed(String),
    Gateway(GatewayError),
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "status": false, "kind": "validation", "message": fields }),
            ),
            Self::Malformed(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "status": false, "kind": "malformed_body", "message": detail }),
            ),
            Self::Gateway(e) if e.is_precondition() => {
                warn!("request rejected: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "status": false, "kind": e.kind(), "message": e.to_string() }),
                )
            }
            Self::Gateway(e) => {
                error!("request failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": false, "kind": e.kind(), "response": e.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Success envelope: `{"status": true, "response": ...}`.
pub fn success(response: Value) -> Json<Value> {
    Json(json!({ "status": true, "response": response }))
}
