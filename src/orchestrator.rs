use tracing::{info, instrument};

use crate::adapters::GeminiClient;
use crate::error::{Result, ReviewError};
use crate::extract::extract_text;
use crate::models::{RenderedReport, ReviewRequest, ReviewResult, Submission};
use crate::prompt;
use crate::response::parse_review;

/// Runs one submission through extraction, prompting, the model call and validation
pub struct Reviewer {
    client: GeminiClient,
}

impl Reviewer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Review a submission and render the markdown report
    pub async fn review(&self, submission: Submission) -> Result<RenderedReport> {
        let job_role = submission.job_role.trim().to_string();
        let result = self.evaluate(submission).await?;
        let report = render_report(&job_role, &result);

        info!("Analysis complete");

        Ok(report)
    }

    /// Review a submission and return the validated model output
    #[instrument(skip(self, submission), fields(role = %submission.job_role, language = %submission.language))]
    pub async fn evaluate(&self, submission: Submission) -> Result<ReviewResult> {
        let request = prepare_request(submission)?;
        self.evaluate_request(&request).await
    }

    /// Send an already validated request to the model
    pub async fn evaluate_request(&self, request: &ReviewRequest) -> Result<ReviewResult> {
        info!("Building prompt");
        let prompt = prompt::build(request);

        info!(model = %self.client.model(), "Calling model");
        let body = self.client.generate(&prompt).await?;

        info!("Validating response");
        parse_review(&body)
    }
}

/// Check the raw inputs and extract the resume text.
/// Runs before any network call so input problems never cost a request.
pub fn prepare_request(submission: Submission) -> Result<ReviewRequest> {
    if submission.job_role.trim().is_empty() {
        return Err(ReviewError::MissingInput(
            "Please specify a target job role.".to_string(),
        ));
    }

    let document = submission.document.ok_or_else(|| {
        ReviewError::MissingInput("Please upload a resume file.".to_string())
    })?;

    info!("Extracting resume text");
    let resume_text = extract_text(&document)?;

    ReviewRequest::new(
        resume_text,
        submission.job_role,
        Some(submission.job_description),
        submission.language,
    )
}

/// Render a review as markdown
pub fn render_report(job_role: &str, result: &ReviewResult) -> RenderedReport {
    let mut md = String::new();

    md.push_str(&format!("### Resume Review for {}\n\n", job_role));
    md.push_str(&format!(
        "**Overall Rating:** {}/10\n\n",
        result.final_score.rating
    ));
    md.push_str(&format!("**Summary:** {}\n\n", result.final_score.summary));

    md.push_str("### Areas of Strength\n\n");
    for strength in &result.feedback_report.areas_of_strength {
        md.push_str(&format!("- {}\n", strength));
    }
    md.push('\n');

    md.push_str("### Suggestions for Improvement\n\n");
    for suggestion in &result.feedback_report.suggestions {
        md.push_str(&format!("**{}:** {}\n\n", suggestion.heading, suggestion.advice));
    }

    md.push_str("### Improved Resume Version\n\n");
    md.push_str(&format!(
        "```markdown\n{}\n```\n",
        result.improved_resume.trim_end()
    ));

    RenderedReport {
        job_role: job_role.to_string(),
        markdown: md,
    }
}
