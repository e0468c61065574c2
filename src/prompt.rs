use serde_json::{json, Value};

use crate::models::{Language, ReviewRequest};

/// Suggestion categories the model must fill, in display order
pub const SUGGESTION_HEADINGS: [&str; 5] = [
    "Clarity & Brevity",
    "Impactful Language",
    "Missing Keywords",
    "Formatting & Readability",
    "Tailoring to the Job",
];

/// System instruction and user message for one review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system_instruction: String,
    pub user_message: String,
}

pub fn build(request: &ReviewRequest) -> Prompt {
    Prompt {
        system_instruction: system_instruction(request.language()),
        user_message: user_message(request),
    }
}

pub fn system_instruction(language: Language) -> String {
    format!(
        r#"You are an expert career coach and a highly experienced resume reviewer.
Your task is to provide a comprehensive, constructive, and actionable review of a resume.

Provide all your responses in {language}.

Your final response must be a single JSON object with the following schema:

{{
  "feedback_report": {{
    "areas_of_strength": ["What the candidate does well. Use clear, bulleted points."],
    "suggestions_for_improvement": [
      {{
        "heading": "{clarity}",
        "advice": "Suggest how to be more concise or clear."
      }},
      {{
        "heading": "{impact}",
        "advice": "Suggest using more action verbs and quantifying achievements."
      }},
      {{
        "heading": "{keywords}",
        "advice": "Identify relevant skills or terms missing from the resume."
      }},
      {{
        "heading": "{formatting}",
        "advice": "Provide tips on layout, spacing, or font."
      }},
      {{
        "heading": "{tailoring}",
        "advice": "Explain how to better align their experience with the job description."
      }}
    ]
  }},
  "final_score": {{
    "rating": "A score from 1 to 10. Do not include the '/10'.",
    "summary": "A brief paragraph summarizing the key takeaways."
  }},
  "improved_resume": "A fully rewritten, improved version of the resume in Markdown format. Ensure it follows all best practices and professional standards."
}}

The 'improved_resume' should be a complete, ready-to-use resume text.
Do not add any text or explanation outside of this structured JSON format."#,
        language = language.name(),
        clarity = SUGGESTION_HEADINGS[0],
        impact = SUGGESTION_HEADINGS[1],
        keywords = SUGGESTION_HEADINGS[2],
        formatting = SUGGESTION_HEADINGS[3],
        tailoring = SUGGESTION_HEADINGS[4],
    )
}

pub fn user_message(request: &ReviewRequest) -> String {
    let mut message = format!(
        "Here is the resume to be reviewed:\n\n---\n{}\n---\n\nTarget Job Role: {}\n\n",
        request.resume_text(),
        request.job_role()
    );

    if let Some(description) = request.job_description() {
        message.push_str(&format!(
            "Here is the job description for a more tailored review:\n\n---\n{}\n---",
            description
        ));
    }

    message
}

/// Response schema passed as `generationConfig.responseSchema`
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "feedback_report": {
                "type": "OBJECT",
                "properties": {
                    "areas_of_strength": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" }
                    },
                    "suggestions_for_improvement": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "heading": { "type": "STRING" },
                                "advice": { "type": "STRING" }
                            }
                        }
                    }
                }
            },
            "final_score": {
                "type": "OBJECT",
                "properties": {
                    "rating": { "type": "INTEGER" },
                    "summary": { "type": "STRING" }
                }
            },
            "improved_resume": { "type": "STRING" }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(description: Option<&str>, language: Language) -> ReviewRequest {
        ReviewRequest::new(
            "Experienced analyst...",
            "Data Analyst",
            description.map(String::from),
            language,
        )
        .unwrap()
    }

    #[test]
    fn test_user_message_without_description() {
        let message = user_message(&request(Some(""), Language::English));
        assert_eq!(
            message,
            "Here is the resume to be reviewed:\n\n---\nExperienced analyst...\n---\n\nTarget Job Role: Data Analyst\n\n"
        );
    }

    #[test]
    fn test_user_message_appends_description_after_resume() {
        let message = user_message(&request(
            Some("Build dashboards in SQL and Tableau."),
            Language::English,
        ));

        let resume_at = message.find("Experienced analyst...").unwrap();
        let description_at = message.find("Build dashboards in SQL and Tableau.").unwrap();
        assert!(resume_at < description_at);
        assert!(message.ends_with(
            "Here is the job description for a more tailored review:\n\n---\nBuild dashboards in SQL and Tableau.\n---"
        ));
    }

    #[test]
    fn test_system_instruction_language_and_headings() {
        let instruction = system_instruction(Language::German);
        assert!(instruction.contains("Provide all your responses in German."));
        assert!(instruction.contains("expert career coach"));
        for heading in SUGGESTION_HEADINGS {
            assert!(instruction.contains(&format!("\"heading\": \"{heading}\"")));
        }
        assert!(instruction.contains("\"improved_resume\""));
    }

    #[test]
    fn test_build_is_deterministic() {
        let req = request(None, Language::Spanish);
        assert_eq!(build(&req), build(&req));
        assert!(build(&req).system_instruction.contains("Spanish"));
    }

    #[test]
    fn test_response_schema_members() {
        let schema = response_schema();
        let props = &schema["properties"];
        assert_eq!(props["final_score"]["properties"]["rating"]["type"], "INTEGER");
        assert_eq!(props["improved_resume"]["type"], "STRING");
        assert_eq!(
            props["feedback_report"]["properties"]["suggestions_for_improvement"]["items"]
                ["properties"]["advice"]["type"],
            "STRING"
        );
    }
}
