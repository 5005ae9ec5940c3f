use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use deck_agent::AgentError;
use thiserror::Error;

/// Failure of a request, mapped to a status code and a `{"detail": ..}` body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The model endpoint failed or answered with something unusable.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::info!("Rejected request: {self}");
        }
        HttpResponse::build(status).json(serde_json::json!({ "detail": self.to_string() }))
    }
}

impl From<deck_core::Error> for AppError {
    fn from(e: deck_core::Error) -> Self {
        match e {
            deck_core::Error::InvalidInput(_) | deck_core::Error::UnsupportedFormat(_) => {
                AppError::BadRequest(e.to_string())
            }
            deck_core::Error::NotFound(_) => AppError::NotFound(e.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Core(inner) => inner.into(),
            AgentError::Timeout(_) => AppError::Timeout(e.to_string()),
            AgentError::Http(_) | AgentError::Status { .. } | AgentError::MalformedResponse(_) => {
                AppError::Upstream(e.to_string())
            }
            AgentError::Config(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Background task failed: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(deck_core::Error::InvalidInput("short".into())), 400),
            (AppError::from(deck_core::Error::UnsupportedFormat("pdf".into())), 400),
            (AppError::from(deck_core::Error::NotFound("markup".into())), 404),
            (AppError::from(deck_core::Error::ZipError("bad".into())), 500),
            (AppError::from(AgentError::MalformedResponse("not JSON".into())), 502),
            (AppError::from(AgentError::Status { code: 429, body: "slow down".into() }), 502),
            (AppError::from(AgentError::Timeout(120)), 504),
            (AppError::from(AgentError::Config("OPENAI_API_KEY is not set".into())), 500),
            (
                AppError::from(AgentError::Core(deck_core::Error::InvalidInput("short".into()))),
                400,
            ),
        ];

        for (error, code) in cases {
            assert_eq!(error.status_code().as_u16(), code, "{error}");
        }
    }
}
