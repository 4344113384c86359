//! Orchestration Controller — the explicit state object behind one analysis
//! session.
//!
//! Phase machine: `Idle → Loading → (Ready | Failed)`, with the orthogonal
//! tip sub-state `Pending → Ready` entered only once a result is stored.
//! Every analyze request increments a monotonically increasing cycle token;
//! completions arriving with a stale token are dropped, so an older cycle's
//! result or tip can never overwrite a newer cycle's state regardless of
//! arrival order.
//!
//! Transient presentation flags (clipboard acknowledgment, upload error) are
//! deadline-based and computed at snapshot time — no sweeper task.

use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::analysis::models::AtsAnalysis;

/// How long the "copied" acknowledgment stays visible.
pub const COPIED_INDICATOR_TTL: Duration = Duration::from_secs(2);
/// How long a rejected-upload banner stays visible.
pub const UPLOAD_ERROR_TTL: Duration = Duration::from_secs(3);

/// Tip sub-state, meaningful only while a result is present.
#[derive(Debug, Clone, PartialEq)]
pub enum TipState {
    Pending,
    Ready(String),
}

/// Main phase of the current analysis cycle.
#[derive(Debug, Clone)]
pub enum CyclePhase {
    Idle,
    Loading,
    Failed { message: String },
    Ready { analysis: AtsAnalysis, tip: TipState },
}

/// The session owned by the controller. Input fields are plain state the
/// presentation layer writes through dedicated endpoints; everything else
/// mutates only via the defined transitions below.
#[derive(Debug)]
pub struct Session {
    pub resume_text: String,
    pub jd_text: String,
    phase: CyclePhase,
    cycle: u64,
    copied_until: Option<Instant>,
    upload_error: Option<(String, Instant)>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            resume_text: String::new(),
            jd_text: String::new(),
            phase: CyclePhase::Idle,
            cycle: 0,
            copied_until: None,
            upload_error: None,
        }
    }

    /// Starts a new analysis cycle: clears any prior result, tip, error, and
    /// copy acknowledgment, enters `Loading`, and returns the cycle token the
    /// in-flight calls must present when they complete.
    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.phase = CyclePhase::Loading;
        self.copied_until = None;
        self.cycle
    }

    /// Synchronous validation failure: no cycle runs, but interest in any
    /// outstanding completion is discarded and the failure replaces the
    /// previous result.
    pub fn fail_validation(&mut self, message: &str) {
        self.cycle += 1;
        self.copied_until = None;
        self.phase = CyclePhase::Failed {
            message: message.to_string(),
        };
    }

    /// Stores a successful analysis for the given cycle. Returns false (and
    /// changes nothing) when the token is stale.
    pub fn complete(&mut self, token: u64, analysis: AtsAnalysis) -> bool {
        if token != self.cycle {
            return false;
        }
        self.phase = CyclePhase::Ready {
            analysis,
            tip: TipState::Pending,
        };
        true
    }

    /// Records a primary-call failure for the given cycle. Returns false when
    /// the token is stale.
    pub fn fail(&mut self, token: u64, message: &str) -> bool {
        if token != self.cycle {
            return false;
        }
        self.phase = CyclePhase::Failed {
            message: message.to_string(),
        };
        true
    }

    /// Lands the refinement tip for the given cycle. Returns false when the
    /// token is stale or the result it belonged to is gone.
    pub fn set_tip(&mut self, token: u64, tip: String) -> bool {
        if token != self.cycle {
            return false;
        }
        match &mut self.phase {
            CyclePhase::Ready { tip: slot, .. } => {
                *slot = TipState::Ready(tip);
                true
            }
            _ => false,
        }
    }

    /// The revised resume of the current result, if one is present.
    pub fn revised_resume(&self) -> Option<&str> {
        match &self.phase {
            CyclePhase::Ready { analysis, .. } => Some(&analysis.revised_resume),
            _ => None,
        }
    }

    pub fn mark_copied(&mut self, now: Instant) {
        self.copied_until = Some(now + COPIED_INDICATOR_TTL);
    }

    pub fn set_upload_error(&mut self, message: &str, now: Instant) {
        self.upload_error = Some((message.to_string(), now + UPLOAD_ERROR_TTL));
    }

    pub fn clear_upload_error(&mut self) {
        self.upload_error = None;
    }

    /// Projects the session into the shape the presentation layer renders.
    /// Transient flags expire here, against the supplied clock.
    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let (status, error, analysis, tip_status, tip) = match &self.phase {
            CyclePhase::Idle => (CycleStatus::Idle, None, None, None, None),
            CyclePhase::Loading => (CycleStatus::Loading, None, None, None, None),
            CyclePhase::Failed { message } => {
                (CycleStatus::Failed, Some(message.clone()), None, None, None)
            }
            CyclePhase::Ready { analysis, tip } => match tip {
                TipState::Pending => (
                    CycleStatus::Ready,
                    None,
                    Some(analysis.clone()),
                    Some(TipStatus::Pending),
                    None,
                ),
                TipState::Ready(text) => (
                    CycleStatus::Ready,
                    None,
                    Some(analysis.clone()),
                    Some(TipStatus::Ready),
                    Some(text.clone()),
                ),
            },
        };

        SessionSnapshot {
            status,
            error,
            analysis,
            tip_status,
            tip,
            copied: self.copied_until.is_some_and(|until| now < until),
            upload_error: self
                .upload_error
                .as_ref()
                .filter(|(_, until)| now < *until)
                .map(|(message, _)| message.clone()),
            resume_chars: self.resume_text.chars().count(),
            jd_chars: self.jd_text.chars().count(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipStatus {
    Pending,
    Ready,
}

/// Read-only projection served to the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: CycleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AtsAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip_status: Option<TipStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    pub copied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_error: Option<String>,
    pub resume_chars: usize,
    pub jd_chars: usize,
}
