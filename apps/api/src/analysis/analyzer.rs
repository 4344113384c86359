//! Remote Analysis Client — the primary, schema-constrained model round trip.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

use crate::analysis::models::AtsAnalysis;
use crate::analysis::prompts::ANALYSIS_PROMPT_TEMPLATE;
use crate::llm_client::{strip_json_fences, GenerativeModel};

/// User-facing message for any primary-call failure. The underlying cause
/// (transport, status, parse, contract violation) goes to the log only.
const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to get an analysis from the AI service. Please try again.";

/// The single generic failure of the primary analysis call.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AnalysisError {
    pub message: String,
}

impl AnalysisError {
    fn new() -> Self {
        Self {
            message: ANALYSIS_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Gemini response schema for the analysis call — the `AtsAnalysis` shape
/// with every field required, so the provider is steered toward (but not
/// trusted to produce) a conforming payload.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": {
                "type": "NUMBER",
                "description": "A score from 1 to 10 on how well the resume matches the job description and ATS best practices."
            },
            "firstImpression": {
                "type": "STRING",
                "description": "A brief, overall first impression of the resume."
            },
            "keywordMatch": {
                "type": "OBJECT",
                "properties": {
                    "matching": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "missing": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "summary": { "type": "STRING" }
                },
                "required": ["matching", "missing", "summary"]
            },
            "actionVerbs": {
                "type": "OBJECT",
                "properties": {
                    "strongVerbsUsed": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "suggestions": {
                        "type": "STRING",
                        "description": "Suggestions for using stronger action verbs."
                    }
                },
                "required": ["strongVerbsUsed", "suggestions"]
            },
            "formattingClarity": {
                "type": "OBJECT",
                "properties": {
                    "positivePoints": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "areasForImprovement": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["positivePoints", "areasForImprovement"]
            },
            "suggestedImprovements": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of actionable suggestions for overall improvement."
            },
            "revisedResume": {
                "type": "STRING",
                "description": "The full text of an improved, ATS-friendly resume."
            }
        },
        "required": [
            "overallScore", "firstImpression", "keywordMatch", "actionVerbs",
            "formattingClarity", "suggestedImprovements", "revisedResume"
        ]
    })
}

/// Analyzes a resume against a job description via one schema-constrained
/// model call. Both inputs must be non-empty (enforced by the caller).
///
/// Any transport, status, parse, or contract failure collapses into one
/// generic `AnalysisError`; nothing is retried.
pub async fn analyze(
    model: &dyn GenerativeModel,
    resume_text: &str,
    jd_text: &str,
) -> Result<AtsAnalysis, AnalysisError> {
    let prompt = ANALYSIS_PROMPT_TEMPLATE
        .replace("{resume}", resume_text)
        .replace("{job_description}", jd_text);

    let text = model
        .generate(&prompt, Some(response_schema()))
        .await
        .map_err(|e| {
            error!("Analysis call failed: {e}");
            AnalysisError::new()
        })?;

    let analysis: AtsAnalysis =
        serde_json::from_str(strip_json_fences(&text)).map_err(|e| {
            error!("Analysis response was not a conforming AtsAnalysis: {e}");
            AnalysisError::new()
        })?;

    analysis.validate().map_err(|reason| {
        error!("Analysis response violated the contract: {reason}");
        AnalysisError::new()
    })?;

    Ok(analysis)
}
