use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ReviewError};
use crate::models::{FeedbackReport, ReviewResult, ScoreSummary, Suggestion};

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Shape of the JSON the model writes, before lenient filtering
#[derive(Debug, Deserialize)]
struct ModelOutput {
    feedback_report: ModelFeedback,
    final_score: ModelScore,
    improved_resume: String,
}

#[derive(Debug, Deserialize)]
struct ModelFeedback {
    areas_of_strength: Vec<String>,
    suggestions_for_improvement: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelScore {
    #[serde(deserialize_with = "integer_or_string")]
    rating: i64,
    summary: String,
}

/// Parse a raw response body into a schema-valid review
pub fn parse_review(body: &str) -> Result<ReviewResult> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ReviewError::MalformedResponse(format!("invalid API response: {e}")))?;

    let candidate = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(ReviewError::EmptyResponse)?;

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| {
            ReviewError::MalformedResponse(format!(
                "candidate has no text content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

    parse_model_output(&text)
}

fn parse_model_output(text: &str) -> Result<ReviewResult> {
    let output: ModelOutput = serde_json::from_str(unfence(text))
        .map_err(|e| ReviewError::MalformedResponse(e.to_string()))?;

    let rating = u8::try_from(output.final_score.rating)
        .ok()
        .filter(|r| (1..=10).contains(r))
        .ok_or_else(|| {
            ReviewError::MalformedResponse(format!(
                "rating {} is outside 1-10",
                output.final_score.rating
            ))
        })?;

    let total = output.feedback_report.suggestions_for_improvement.len();
    let suggestions: Vec<Suggestion> = output
        .feedback_report
        .suggestions_for_improvement
        .iter()
        .filter_map(to_suggestion)
        .collect();

    if suggestions.len() < total {
        debug!(
            skipped = total - suggestions.len(),
            "Skipped incomplete suggestions"
        );
    }

    Ok(ReviewResult {
        feedback_report: FeedbackReport {
            areas_of_strength: output.feedback_report.areas_of_strength,
            suggestions,
        },
        final_score: ScoreSummary {
            rating,
            summary: output.final_score.summary,
        },
        improved_resume: output.improved_resume,
    })
}

fn to_suggestion(value: &Value) -> Option<Suggestion> {
    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Some(Suggestion {
        heading: field("heading")?,
        advice: field("advice")?,
    })
}

fn integer_or_string<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rating {
        Int(i64),
        Text(String),
    }

    match Rating::deserialize(deserializer)? {
        Rating::Int(n) => Ok(n),
        Rating::Text(s) => s
            .trim()
            .trim_end_matches("/10")
            .trim()
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

/// Body of a markdown code block around the model output, whatever its info string.
/// Text without an opening fence is returned trimmed.
fn unfence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let body = match rest.split_once('\n') {
        Some((info, body)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
