use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use extract::ExtractError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::pipeline::PipelineError;

pub const NO_NUMBERS_MESSAGE: &str = "No numbers found in the text. Please include some numerical data.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("{0}")]
    BadRequest(String),

    #[error("a visualization is already in progress")]
    Busy,

    #[error("nothing to replay yet")]
    NothingToReplay,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::EmptyText => (StatusCode::BAD_REQUEST, "empty_text", "Please enter some text to visualize.".to_string()),
            Self::BadRequest(reason) => (StatusCode::BAD_REQUEST, "bad_request", reason.clone()),
            Self::Busy => (
                StatusCode::CONFLICT,
                "busy",
                "A visualization is already being generated. Please wait for it to finish.".to_string(),
            ),
            Self::NothingToReplay => (
                StatusCode::NOT_FOUND,
                "nothing_to_replay",
                "There is no visualization to replay yet.".to_string(),
            ),
            Self::Pipeline(PipelineError::Extract(ExtractError::NoDataFound)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "no_data_found", NO_NUMBERS_MESSAGE.to_string())
            }
            Self::Pipeline(PipelineError::Extract(ExtractError::Extraction(_))) => (
                StatusCode::BAD_GATEWAY,
                "extraction_failed",
                "Error generating visualization. Please try again.".to_string(),
            ),
            Self::Pipeline(PipelineError::Chart(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_input",
                format!("The extracted data cannot be charted: {}.", e),
            ),
            Self::Pipeline(PipelineError::StructuredUnavailable) => (
                StatusCode::BAD_REQUEST,
                "structured_unavailable",
                "Structured extraction is not configured on this server.".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            error!(error = %self, code, "request failed");
        } else {
            warn!(error = %self, code, "request rejected");
        }

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart::InvalidInputError;
    use extract::ExtractionError;

    #[test]
    fn test_status_per_failure_class() {
        let cases = [
            (ApiError::EmptyText, StatusCode::BAD_REQUEST),
            (ApiError::Busy, StatusCode::CONFLICT),
            (ApiError::NothingToReplay, StatusCode::NOT_FOUND),
            (
                ApiError::Pipeline(PipelineError::Extract(ExtractError::NoDataFound)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Pipeline(PipelineError::Extract(ExtractError::Extraction(ExtractionError::Service(
                    "quota".to_string(),
                )))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Pipeline(PipelineError::Chart(InvalidInputError::ZeroTotal)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.parts().0, expected, "{}", err);
        }
    }

    #[test]
    fn test_no_data_message() {
        let (_, code, message) = ApiError::Pipeline(PipelineError::Extract(ExtractError::NoDataFound)).parts();

        assert_eq!(code, "no_data_found");
        assert_eq!(message, NO_NUMBERS_MESSAGE);
    }
}
