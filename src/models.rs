use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReviewError};

/// Language the feedback is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(wanted) || l.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Unsupported language '{}'. Expected one of: English, Spanish, French, German",
                    wanted
                )
            })
    }
}

/// Kind of uploaded resume document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Pdf,
    PlainText,
}

impl DocumentType {
    /// Resolve from a MIME type such as `application/pdf`
    pub fn from_mime(mime: &str) -> Result<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(DocumentType::Pdf),
            "text/plain" | "text/markdown" => Ok(DocumentType::PlainText),
            other => Err(ReviewError::Extraction(format!(
                "Unsupported document type: {other}"
            ))),
        }
    }

    /// Resolve from a file name extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Ok(DocumentType::Pdf),
            "txt" | "text" | "md" => Ok(DocumentType::PlainText),
            _ => Err(ReviewError::Extraction(format!(
                "Unsupported document type for {}. Upload a PDF or text file",
                path.display()
            ))),
        }
    }
}

/// An uploaded resume before text extraction
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub document_type: DocumentType,
}

impl Document {
    pub fn new(bytes: Vec<u8>, document_type: DocumentType) -> Self {
        Self {
            bytes,
            document_type,
        }
    }
}

/// Raw inputs from whoever drives the pipeline
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub document: Option<Document>,
    pub job_role: String,
    pub job_description: String,
    pub language: Language,
}

/// A validated review request, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    resume_text: String,
    job_role: String,
    job_description: Option<String>,
    language: Language,
}

impl ReviewRequest {
    pub fn new(
        resume_text: impl Into<String>,
        job_role: impl Into<String>,
        job_description: Option<String>,
        language: Language,
    ) -> Result<Self> {
        let resume_text = resume_text.into();
        let job_role = job_role.into();

        if job_role.trim().is_empty() {
            return Err(ReviewError::MissingInput(
                "Please specify a target job role.".to_string(),
            ));
        }
        if resume_text.trim().is_empty() {
            return Err(ReviewError::MissingInput(
                "Please upload a resume to get feedback.".to_string(),
            ));
        }

        Ok(Self {
            resume_text,
            job_role: job_role.trim().to_string(),
            job_description: job_description.filter(|d| !d.trim().is_empty()),
            language,
        })
    }

    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    pub fn job_role(&self) -> &str {
        &self.job_role
    }

    pub fn job_description(&self) -> Option<&str> {
        self.job_description.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

/// One categorized piece of advice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub heading: String,
    pub advice: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub areas_of_strength: Vec<String>,
    #[serde(rename = "suggestions_for_improvement")]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub rating: u8,
    pub summary: String,
}

/// Schema-valid feedback returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub feedback_report: FeedbackReport,
    pub final_score: ScoreSummary,
    pub improved_resume: String,
}

/// Display-ready markdown report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub job_role: String,
    pub markdown: String,
}

impl fmt::Display for RenderedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markdown)
    }
}
