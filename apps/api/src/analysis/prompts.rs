// All LLM prompt constants for the analysis module.
// Placeholders are replaced verbatim before sending; user text is embedded as-is.

/// Primary analysis prompt template.
/// Replace `{resume}` and `{job_description}` before sending.
/// The call itself is constrained to the `AtsAnalysis` response schema.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Act as an expert career coach and professional resume writer specializing in ATS optimization.
Analyze the following resume in the context of the provided job description.

**Resume:**
{resume}

**Job Description:**
{job_description}

Provide a detailed analysis and generate an improved resume.
Your response must be a JSON object matching the provided schema.
Focus on keyword alignment, action verbs, clarity, and formatting.
The 'revisedResume' should be a complete, ready-to-use text document."#;

/// Refinement tip prompt template. Replace `{revised_resume}` before sending.
/// Deliberately steered away from keywords/formatting so it does not
/// duplicate the primary call's feedback.
pub const REFINEMENT_PROMPT_TEMPLATE: &str = r#"You are an elite career coach and senior hiring manager reviewing a resume that has already been optimized for ATS.
Your task is to provide one final, powerful suggestion to improve its impact on a human reader.
Do not comment on keywords or basic formatting. Focus on tone, impact, storytelling, or high-level strategy.
Your feedback should be a single, concise paragraph.

**Resume to review:**
{revised_resume}

Provide your single, most impactful tip."#;
