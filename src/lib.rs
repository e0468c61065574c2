pub mod adapters;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod retry;

pub use adapters::{GeminiClient, GenerateContentRequest};
pub use config::Config;
pub use error::{ApiError, ReviewError};
pub use extract::{extract_text, read_document};
pub use models::*;
pub use orchestrator::{prepare_request, render_report, Reviewer};
pub use prompt::Prompt;
pub use response::parse_review;
pub use retry::{RetryPolicy, Retryable};
