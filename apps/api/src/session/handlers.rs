//! Axum route handlers for the session API — the surface the browser
//! front-end renders from.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

use crate::analysis::{analyzer, refiner};
use crate::errors::AppError;
use crate::session::state::{Session, SessionSnapshot};
use crate::state::AppState;

const VALIDATION_MESSAGE: &str = "Please provide both a resume and a job description.";
const UPLOAD_TYPE_MESSAGE: &str = "Please upload a plain text (.txt) file.";
const UPLOAD_READ_MESSAGE: &str = "Could not read the file as text.";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateInputsRequest {
    pub resume_text: Option<String>,
    pub jd_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CopyResponse {
    /// Full revised-resume text for the browser to place on the clipboard.
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
///
/// Current controller state. The front-end polls this while the tip is
/// pending and to let transient flags expire.
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let session = state.session.lock().await;
    Json(session.snapshot(Instant::now()))
}

/// PUT /api/v1/session/inputs
///
/// Replaces the resume and/or job-description input text.
pub async fn handle_update_inputs(
    State(state): State<AppState>,
    Json(request): Json<UpdateInputsRequest>,
) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    if let Some(text) = request.resume_text {
        session.resume_text = text;
    }
    if let Some(text) = request.jd_text {
        session.jd_text = text;
    }
    Json(session.snapshot(Instant::now()))
}

/// POST /api/v1/session/analyze
///
/// Runs one analysis cycle: validate → primary call → store result → spawn
/// the tip continuation. The response carries the result; the tip lands in
/// the session afterwards without blocking anything.
pub async fn handle_analyze(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let (token, resume_text, jd_text) = {
        let mut session = state.session.lock().await;
        if session.resume_text.trim().is_empty() || session.jd_text.trim().is_empty() {
            session.fail_validation(VALIDATION_MESSAGE);
            return Err(AppError::Validation(VALIDATION_MESSAGE.to_string()));
        }
        let token = session.begin_cycle();
        (token, session.resume_text.clone(), session.jd_text.clone())
    };

    // The lock is NOT held across the network call.
    match analyzer::analyze(state.llm.as_ref(), &resume_text, &jd_text).await {
        Ok(analysis) => {
            let revised_resume = analysis.revised_resume.clone();
            let stored = {
                let mut session = state.session.lock().await;
                session.complete(token, analysis)
            };

            if stored {
                spawn_tip_fetch(state.clone(), token, revised_resume);
            } else {
                debug!("Dropping analysis result for superseded cycle {token}");
            }

            let session = state.session.lock().await;
            Ok(Json(session.snapshot(Instant::now())))
        }
        Err(err) => {
            let mut session = state.session.lock().await;
            if !session.fail(token, &err.message) {
                debug!("Dropping analysis failure for superseded cycle {token}");
            }
            Err(err.into())
        }
    }
}

/// Fetches the refinement tip as an independent continuation of a stored
/// result. Never fails; a stale cycle token means the tip is discarded.
fn spawn_tip_fetch(state: AppState, token: u64, revised_resume: String) {
    tokio::spawn(async move {
        let tip = refiner::refinement_tip(state.llm.as_ref(), &revised_resume).await;
        let mut session = state.session.lock().await;
        if !session.set_tip(token, tip) {
            debug!("Dropping refinement tip for superseded cycle {token}");
        }
    });
}

/// POST /api/v1/session/resume-file
///
/// Multipart upload of a single plain-text file. On success the resume input
/// is replaced wholesale; on rejection the existing text is untouched and a
/// transient upload error is set.
pub async fn handle_resume_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::UnreadableFile(format!("Malformed upload: {e}")))?
        .ok_or_else(|| AppError::Validation("No file part in the upload".to_string()))?;

    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::UnreadableFile(format!("Could not read the upload: {e}")))?;

    let mut session = state.session.lock().await;
    accept_resume_file(&mut session, content_type.as_deref(), &bytes, Instant::now())?;
    Ok(Json(session.snapshot(Instant::now())))
}

/// Applies the upload gate: `text/plain` content type and valid UTF-8 bytes.
/// Split from the handler so the policy is testable without multipart plumbing.
fn accept_resume_file(
    session: &mut Session,
    content_type: Option<&str>,
    bytes: &Bytes,
    now: Instant,
) -> Result<(), AppError> {
    if content_type != Some("text/plain") {
        session.set_upload_error(UPLOAD_TYPE_MESSAGE, now);
        return Err(AppError::UnsupportedFileType(UPLOAD_TYPE_MESSAGE.to_string()));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => {
            session.resume_text = text.to_string();
            session.clear_upload_error();
            Ok(())
        }
        Err(_) => {
            session.set_upload_error(UPLOAD_READ_MESSAGE, now);
            Err(AppError::UnreadableFile(UPLOAD_READ_MESSAGE.to_string()))
        }
    }
}

/// POST /api/v1/session/copy
///
/// Returns the revised-resume text for clipboard copy and arms the transient
/// "copied" acknowledgment.
pub async fn handle_copy(State(state): State<AppState>) -> Result<Json<CopyResponse>, AppError> {
    let mut session = state.session.lock().await;
    let text = session
        .revised_resume()
        .ok_or_else(|| AppError::NotFound("No revised resume to copy yet".to_string()))?
        .to_string();
    session.mark_copied(Instant::now());
    Ok(Json(CopyResponse { text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::{GenerativeModel, LlmError};
    use crate::session::state::{CycleStatus, TipStatus};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::Mutex;
    use tokio::time::Duration;

    const ANALYSIS_PAYLOAD: &str = r#"{
        "overallScore": 7,
        "firstImpression": "Strong backend profile.",
        "keywordMatch": {"matching": ["Go"], "missing": ["gRPC"], "summary": "Decent."},
        "actionVerbs": {"strongVerbsUsed": ["Built"], "suggestions": "Vary the verbs."},
        "formattingClarity": {"positivePoints": ["Clean layout"], "areasForImprovement": []},
        "suggestedImprovements": ["Add metrics"],
        "revisedResume": "JANE DOE\nSenior Software Engineer\n..."
    }"#;

    /// Pops one scripted outcome per call; counts calls.
    struct ScriptedModel {
        responses: StdMutex<VecDeque<Result<String, &'static str>>>,
        calls: StdMutex<u32>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String, &'static str>>) -> Self {
            Self {
                responses: StdMutex::new(responses.into()),
                calls: StdMutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            _prompt: &str,
            _response_schema: Option<Value>,
        ) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(LlmError::Api {
                    status: 500,
                    message: message.to_string(),
                }),
                None => panic!("ScriptedModel ran out of responses"),
            }
        }
    }

    fn test_state(model: Arc<ScriptedModel>) -> AppState {
        AppState {
            llm: model,
            config: Config {
                gemini_api_key: "test-key".to_string(),
                port: 0,
                rust_log: "debug".to_string(),
            },
            session: Arc::new(Mutex::new(Session::new())),
        }
    }

    async fn seed_inputs(state: &AppState, resume: &str, jd: &str) {
        let mut session = state.session.lock().await;
        session.resume_text = resume.to_string();
        session.jd_text = jd.to_string();
    }

    /// Lets the spawned tip task run to completion on the test runtime.
    async fn drain_spawned_tasks() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_analyze_happy_path_then_tip_lands() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ANALYSIS_PAYLOAD.to_string()),
            Ok("Lead with the migration story.".to_string()),
        ]));
        let state = test_state(model.clone());
        seed_inputs(&state, "Experienced engineer...", "Seeking Go developer...").await;

        let Json(snapshot) = handle_analyze(State(state.clone())).await.unwrap();
        // Primary result is visible immediately; the tip is still pending.
        assert_eq!(snapshot.status, CycleStatus::Ready);
        assert_eq!(snapshot.analysis.as_ref().unwrap().overall_score, 7.0);
        assert_eq!(snapshot.tip_status, Some(TipStatus::Pending));

        drain_spawned_tasks().await;
        let Json(snapshot) = handle_get_session(State(state.clone())).await;
        assert_eq!(snapshot.tip_status, Some(TipStatus::Ready));
        assert_eq!(
            snapshot.tip.as_deref(),
            Some("Lead with the migration story.")
        );
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_analyze_with_empty_inputs_makes_no_network_call() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let state = test_state(model.clone());
        seed_inputs(&state, "", "Seeking Go developer...").await;

        let err = handle_analyze(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(model.call_count(), 0);

        let Json(snapshot) = handle_get_session(State(state)).await;
        assert_eq!(snapshot.status, CycleStatus::Failed);
        assert_eq!(snapshot.error.as_deref(), Some(VALIDATION_MESSAGE));
    }

    #[tokio::test]
    async fn test_analyze_failure_clears_prior_result_and_skips_tip() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ANALYSIS_PAYLOAD.to_string()),
            Ok("tip one".to_string()),
            Err("model exploded"),
        ]));
        let state = test_state(model.clone());
        seed_inputs(&state, "resume", "jd").await;

        handle_analyze(State(state.clone())).await.unwrap();
        drain_spawned_tasks().await;

        // Second cycle fails: no stale result may survive.
        let err = handle_analyze(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::Analysis(_)));

        let Json(snapshot) = handle_get_session(State(state)).await;
        assert_eq!(snapshot.status, CycleStatus::Failed);
        assert!(snapshot.analysis.is_none());
        assert!(snapshot.tip.is_none());
        // Two analysis calls + one tip call; no tip attempted for the failure.
        assert_eq!(model.call_count(), 3);
    }

    #[tokio::test]
    async fn test_tip_failure_resolves_to_fallback_not_error() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ANALYSIS_PAYLOAD.to_string()),
            Err("tip service down"),
        ]));
        let state = test_state(model);
        seed_inputs(&state, "resume", "jd").await;

        handle_analyze(State(state.clone())).await.unwrap();
        drain_spawned_tasks().await;

        let Json(snapshot) = handle_get_session(State(state)).await;
        assert_eq!(snapshot.status, CycleStatus::Ready);
        assert_eq!(snapshot.tip_status, Some(TipStatus::Ready));
        assert_eq!(snapshot.tip.as_deref(), Some(refiner::TIP_FALLBACK));
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_returns_text_and_flag_clears_after_two_seconds() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(ANALYSIS_PAYLOAD.to_string()),
            Ok("tip".to_string()),
        ]));
        let state = test_state(model);
        seed_inputs(&state, "resume", "jd").await;
        handle_analyze(State(state.clone())).await.unwrap();

        let Json(copy) = handle_copy(State(state.clone())).await.unwrap();
        assert!(copy.text.starts_with("JANE DOE"));

        let Json(snapshot) = handle_get_session(State(state.clone())).await;
        assert!(snapshot.copied);

        tokio::time::advance(Duration::from_secs(2)).await;
        let Json(snapshot) = handle_get_session(State(state)).await;
        assert!(!snapshot.copied);
    }

    #[tokio::test]
    async fn test_copy_without_result_is_rejected() {
        let state = test_state(Arc::new(ScriptedModel::new(vec![])));
        let err = handle_copy(State(state)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_inputs_replaces_only_given_fields() {
        let state = test_state(Arc::new(ScriptedModel::new(vec![])));
        seed_inputs(&state, "old resume", "old jd").await;

        let Json(snapshot) = handle_update_inputs(
            State(state.clone()),
            Json(UpdateInputsRequest {
                resume_text: Some("new resume".to_string()),
                jd_text: None,
            }),
        )
        .await;
        assert_eq!(snapshot.resume_chars, "new resume".chars().count());

        let session = state.session.lock().await;
        assert_eq!(session.resume_text, "new resume");
        assert_eq!(session.jd_text, "old jd");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_wrong_type_leaves_resume_and_sets_transient_error() {
        let state = test_state(Arc::new(ScriptedModel::new(vec![])));
        seed_inputs(&state, "existing resume", "jd").await;

        {
            let mut session = state.session.lock().await;
            let err = accept_resume_file(
                &mut session,
                Some("application/pdf"),
                &Bytes::from_static(b"%PDF-1.4"),
                Instant::now(),
            )
            .unwrap_err();
            assert!(matches!(err, AppError::UnsupportedFileType(_)));
            assert_eq!(session.resume_text, "existing resume");
        }

        let Json(snapshot) = handle_get_session(State(state.clone())).await;
        assert_eq!(snapshot.upload_error.as_deref(), Some(UPLOAD_TYPE_MESSAGE));

        tokio::time::advance(Duration::from_secs(3)).await;
        let Json(snapshot) = handle_get_session(State(state)).await;
        assert!(snapshot.upload_error.is_none());
    }

    #[tokio::test]
    async fn test_upload_invalid_utf8_is_unreadable() {
        let state = test_state(Arc::new(ScriptedModel::new(vec![])));
        seed_inputs(&state, "existing resume", "jd").await;

        let mut session = state.session.lock().await;
        let err = accept_resume_file(
            &mut session,
            Some("text/plain"),
            &Bytes::from_static(&[0xff, 0xfe, 0x00]),
            Instant::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::UnreadableFile(_)));
        assert_eq!(session.resume_text, "existing resume");
    }

    #[tokio::test]
    async fn test_upload_plain_text_replaces_resume_and_clears_error() {
        let state = test_state(Arc::new(ScriptedModel::new(vec![])));

        let mut session = state.session.lock().await;
        session.set_upload_error("stale error", Instant::now());
        accept_resume_file(
            &mut session,
            Some("text/plain"),
            &Bytes::from_static(b"Jane Doe\nSenior Engineer"),
            Instant::now(),
        )
        .unwrap();
        assert_eq!(session.resume_text, "Jane Doe\nSenior Engineer");
        assert!(session.snapshot(Instant::now()).upload_error.is_none());
    }
}
