use thiserror::Error;

use crate::retry::Retryable;

/// Failure of a single request to the model API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid request: {0}")]
    Request(String),
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => !e.is_builder(),
            // Rejected request or credentials: the same payload fails the same way again
            ApiError::Status { status, .. } => !matches!(status, 400 | 401 | 403 | 404),
            ApiError::Request(_) => false,
        }
    }
}

/// Errors surfaced by the review pipeline
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Failed to extract resume text: {0}")]
    Extraction(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API request failed: {0}")]
    TransientApi(#[source] ApiError),

    #[error("API unavailable after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: ApiError,
    },

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

impl ReviewError {
    /// Message suitable for showing to the person who submitted the resume
    pub fn user_message(&self) -> String {
        match self {
            ReviewError::Extraction(detail) => {
                format!("Error extracting text from the resume: {detail}")
            }
            ReviewError::MissingInput(msg) => msg.clone(),
            ReviewError::Configuration(_) => {
                "API key not found. Set GEMINI_API_KEY or api.api_key in the config file."
                    .to_string()
            }
            ReviewError::TransientApi(_) => {
                "An API error occurred. Please check the logs for details.".to_string()
            }
            ReviewError::RetryExhausted { .. } => {
                "The API is currently unavailable. Please try again in a few moments."
                    .to_string()
            }
            ReviewError::EmptyResponse => {
                "Could not get a response from the AI. Please try again.".to_string()
            }
            ReviewError::MalformedResponse(detail) => format!(
                "There was an issue processing the AI's response: {detail}. \
                 The AI may have provided an unexpected output format."
            ),
        }
    }
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_retryable() {
        let err = ApiError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert!(err.is_retryable());

        for status in [408, 429, 500, 502] {
            let err = ApiError::Status {
                status,
                body: String::new(),
            };
            assert!(err.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn test_rejected_requests_are_not_retryable() {
        for status in [400, 401, 403, 404] {
            let err = ApiError::Status {
                status,
                body: "API key not valid".to_string(),
            };
            assert!(!err.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn test_request_errors_are_not_retryable() {
        assert!(!ApiError::Request("bad url".to_string()).is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let exhausted = ReviewError::RetryExhausted {
            attempts: 5,
            last: ApiError::Status {
                status: 500,
                body: String::new(),
            },
        };
        assert!(exhausted.user_message().contains("currently unavailable"));

        assert_eq!(
            ReviewError::EmptyResponse.user_message(),
            "Could not get a response from the AI. Please try again."
        );

        let malformed = ReviewError::MalformedResponse("missing field `final_score`".to_string());
        assert!(malformed.user_message().contains("missing field `final_score`"));

        let missing = ReviewError::MissingInput("Please specify a target job role.".to_string());
        assert_eq!(missing.user_message(), "Please specify a target job role.");
    }
}
