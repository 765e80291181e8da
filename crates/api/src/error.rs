use adrotate_core::RotationError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    InvalidPosition(String),
    NotFound(String),
    Conflict(String),
    Internal,
}

#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub request_id: String,
}

impl AppError {
    pub fn with_request_id(self, request_id: &str) -> ApiError {
        ApiError {
            error: self,
            request_id: request_id.to_string(),
        }
    }
}

impl From<RotationError> for AppError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::InvalidPosition(_) => AppError::InvalidPosition(err.to_string()),
            RotationError::NotFound(entity) => AppError::NotFound(format!("{entity} not found")),
            RotationError::UnitNotInModule { .. } => AppError::BadRequest(err.to_string()),
            RotationError::SelectionAlreadyConfirmed { .. } => AppError::Conflict(err.to_string()),
            RotationError::Store(store_err) => {
                error!(error = %store_err, "store failure");
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self.error {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg),
            AppError::InvalidPosition(msg) => (StatusCode::BAD_REQUEST, "invalid_position", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Unexpected error".to_string(),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code: code.to_string(),
                    message,
                    request_id: self.request_id,
                },
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use adrotate_core::StoreError;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_with_request_id() {
        let err = AppError::Internal.with_request_id("req_123");
        assert_eq!(err.request_id, "req_123");
    }

    #[test]
    fn test_bad_request_response() {
        rt().block_on(async {
            let err = AppError::BadRequest("missing field".to_string()).with_request_id("req_001");
            let (status, json) = render(err).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"], "invalid_request");
            assert_eq!(json["error"]["message"], "missing field");
            assert_eq!(json["error"]["request_id"], "req_001");
        });
    }

    #[test]
    fn test_invalid_position_from_rotation_error() {
        rt().block_on(async {
            let err = AppError::from(RotationError::InvalidPosition(0)).with_request_id("req_002");
            let (status, json) = render(err).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error"]["code"], "invalid_position");
        });
    }

    #[test]
    fn test_not_found_from_rotation_error() {
        rt().block_on(async {
            let err = AppError::from(RotationError::NotFound("module")).with_request_id("req_003");
            let (status, json) = render(err).await;

            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(json["error"]["code"], "not_found");
            assert_eq!(json["error"]["message"], "module not found");
        });
    }

    #[test]
    fn test_already_confirmed_is_conflict() {
        rt().block_on(async {
            let err = AppError::from(RotationError::SelectionAlreadyConfirmed {
                module_id: "mod_1".to_string(),
            })
            .with_request_id("req_004");
            let (status, json) = render(err).await;

            assert_eq!(status, StatusCode::CONFLICT);
            assert_eq!(json["error"]["code"], "conflict");
        });
    }

    #[test]
    fn test_store_failure_hides_details() {
        rt().block_on(async {
            let err = AppError::from(RotationError::Store(StoreError::Persistence(
                "connection reset".to_string(),
            )))
            .with_request_id("req_005");
            let (status, json) = render(err).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json["error"]["code"], "internal_error");
            assert_eq!(json["error"]["message"], "Unexpected error");
        });
    }
}
