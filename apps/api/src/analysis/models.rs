//! Data model for the structured analysis returned by the model.
//!
//! The wire shape is camelCase JSON with every field required; the model
//! response is untrusted, so deserialization is followed by `validate()`
//! before a value is exposed as a result.

use serde::{Deserialize, Serialize};

/// Keyword alignment between the resume and the job description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub matching: Vec<String>,
    pub missing: Vec<String>,
    pub summary: String,
}

/// Action-verb usage feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionVerbs {
    pub strong_verbs_used: Vec<String>,
    pub suggestions: String,
}

/// Formatting and clarity feedback, split into strengths and weaknesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattingClarity {
    pub positive_points: Vec<String>,
    pub areas_for_improvement: Vec<String>,
}

/// Full structured output of the primary analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsAnalysis {
    /// 1–10, how well the resume matches the JD and ATS best practices.
    pub overall_score: f64,
    pub first_impression: String,
    pub keyword_match: KeywordMatch,
    pub action_verbs: ActionVerbs,
    pub formatting_clarity: FormattingClarity,
    pub suggested_improvements: Vec<String>,
    /// Complete, ready-to-use text of the rewritten resume.
    pub revised_resume: String,
}

impl AtsAnalysis {
    /// Rejects payloads that deserialized but violate the contract.
    /// The provider's schema enforcement is not trusted.
    pub fn validate(&self) -> Result<(), String> {
        if !(1.0..=10.0).contains(&self.overall_score) {
            return Err(format!(
                "overallScore {} outside the 1-10 range",
                self.overall_score
            ));
        }
        if self.revised_resume.trim().is_empty() {
            return Err("revisedResume is empty".to_string());
        }
        Ok(())
    }
}
