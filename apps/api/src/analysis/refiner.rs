//! Remote Refinement Client — best-effort "senior reviewer" tip.
//!
//! This call never fails outward: any error resolves to a fixed fallback
//! string so the main result stays fully usable.

use tracing::warn;

use crate::analysis::prompts::REFINEMENT_PROMPT_TEMPLATE;
use crate::llm_client::GenerativeModel;

/// Substituted whenever the tip call fails for any reason.
pub const TIP_FALLBACK: &str =
    "Could not retrieve the final refinement tip due to an issue with the AI service.";

/// Fetches one concise, human-impact-oriented paragraph of feedback on the
/// revised resume. Unconstrained text call — no response schema.
pub async fn refinement_tip(model: &dyn GenerativeModel, revised_resume: &str) -> String {
    let prompt = REFINEMENT_PROMPT_TEMPLATE.replace("{revised_resume}", revised_resume);

    match model.generate(&prompt, None).await {
        Ok(tip) => tip,
        Err(e) => {
            warn!("Refinement tip call failed, using fallback: {e}");
            TIP_FALLBACK.to_string()
        }
    }
}
