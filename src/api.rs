use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lfg_reputation::{
    Endorsement, ParticipantOutcome, ParticipantStatus, Report, ReportReason, ReputationDisplay,
    ReputationError,
};

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiData<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Failure envelope: `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionCompleteRequest {
    pub user_id: String,
    pub session_id: String,
    pub status: String,
    pub minutes_late: Option<u32>,
    pub completion_percent: Option<u32>,
    pub was_kicked: Option<bool>,
}

impl SessionCompleteRequest {
    pub fn outcome(&self) -> Result<ParticipantOutcome, ReputationError> {
        let status = ParticipantStatus::from_str(&self.status).ok_or_else(|| {
            ReputationError::Validation(format!("unknown participant status: {}", self.status))
        })?;
        Ok(ParticipantOutcome {
            status,
            minutes_late: self.minutes_late.unwrap_or(0),
            completion_percent: self.completion_percent,
            was_kicked: self.was_kicked.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SessionCompleteResponse {
    pub score_change: f64,
    pub reputation: ReputationDisplay,
}

#[derive(Debug, Deserialize)]
pub struct EndorseRequest {
    pub giver_id: String,
    pub receiver_id: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndorseResponse {
    pub endorsement: Endorsement,
    pub reputation: ReputationDisplay,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: String,
    pub details: Option<String>,
    pub session_id: Option<String>,
}

impl ReportRequest {
    pub fn parsed_reason(&self) -> Result<ReportReason, ReputationError> {
        ReportReason::from_str(&self.reason).ok_or_else(|| {
            ReputationError::Validation(format!("unknown report reason: {}", self.reason))
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report: Report,
    pub reputation: ReputationDisplay,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub user_id: String,
    pub session_id: String,
    pub session_start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub hours_before_start: f64,
    pub penalty_applied: bool,
    pub reputation: ReputationDisplay,
}

#[derive(Debug, Deserialize)]
pub struct SeasonResetRequest {
    pub user_id: String,
    pub drift_factor: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SeasonResetResponse {
    pub new_score: f64,
    pub reputation: ReputationDisplay,
}

/// Rejects empty or whitespace-only id fields before touching the engine.
pub fn require(value: &str, field: &str) -> Result<(), ReputationError> {
    if value.trim().is_empty() {
        return Err(ReputationError::Validation(format!(
            "missing required field: {}",
            field
        )));
    }
    Ok(())
}
