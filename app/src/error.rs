use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;

/// Erros devolvidos pelos endpoints. Cada variante decide o próprio status e corpo JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Configuração de implantação ausente (URL base ou token da Spedy)
    #[error("{0}")]
    Configuration(String),

    /// Entrada malformada ou incompleta
    #[error("{0}")]
    Validation(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// A Spedy respondeu, mas com status de falha
    #[error("spedy_error (HTTP {http_status})")]
    Upstream { http_status: u16, response: Value },

    #[error("internal_error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Configuration(msg) | ApiError::Validation(msg) => json!({ "error": msg }),
            ApiError::MethodNotAllowed => json!({ "error": "Method Not Allowed" }),
            ApiError::Upstream { http_status, response } => json!({
                "error": "spedy_error",
                "httpStatus": http_status,
                "response": response,
            }),
            ApiError::Internal(details) => json!({
                "error": "internal_error",
                "details": details,
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
