//! HTTP错误映射
//!
//! 所有错误响应体均为 `{ "error": string }`

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dentlab_core::LabError;
use serde_json::json;

/// 接口错误
#[derive(Debug)]
pub enum ApiError {
    Lab(LabError),
    BadRequest(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<LabError> for ApiError {
    fn from(err: LabError) -> Self {
        ApiError::Lab(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// 请求体解析失败时同样返回JSON错误
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Lab(err) => match err {
                LabError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                LabError::Validation(_) | LabError::InvalidStateTransition { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                LabError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                LabError::Database(_)
                | LabError::Io(_)
                | LabError::Serialization(_)
                | LabError::Config(_)
                | LabError::Internal(_) => {
                    tracing::error!("Request failed: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (LabError::NotFound("case".into()), StatusCode::NOT_FOUND),
            (LabError::Validation("doctor".into()), StatusCode::BAD_REQUEST),
            (LabError::Conflict("case".into()), StatusCode::CONFLICT),
            (LabError::Database("pool timed out".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_server_errors_hide_details() {
        let (_, message) =
            ApiError::from(LabError::Database("password authentication failed".into()))
                .status_and_message();
        assert_eq!(message, "Internal server error");
    }
}
