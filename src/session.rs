use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::generate_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Registered,
    Joined,
    Completed,
    LeftEarly,
    Kicked,
    NoShow,
    Cancelled,
}

impl ParticipantStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "REGISTERED" => Some(ParticipantStatus::Registered),
            "JOINED" => Some(ParticipantStatus::Joined),
            "COMPLETED" => Some(ParticipantStatus::Completed),
            "LEFT_EARLY" => Some(ParticipantStatus::LeftEarly),
            "KICKED" => Some(ParticipantStatus::Kicked),
            "NO_SHOW" => Some(ParticipantStatus::NoShow),
            "CANCELLED" => Some(ParticipantStatus::Cancelled),
            _ => None,
        }
    }
}

/// A hosted game session. Status transitions are one-directional:
/// SCHEDULED → IN_PROGRESS → COMPLETED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        host_id: impl Into<String>,
        title: impl Into<String>,
        scheduled_start: DateTime<Utc>,
        scheduled_end: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: generate_id("session"),
            host_id: host_id.into(),
            title: title.into(),
            scheduled_start,
            scheduled_end,
            actual_start: None,
            actual_end: None,
            status: SessionStatus::Scheduled,
            created_at: Utc::now(),
        }
    }
}

/// One user's participation in one session, keyed by (session, user).
/// Terminal once the session completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParticipant {
    pub session_id: String,
    pub user_id: String,
    pub status: ParticipantStatus,
    pub joined_at: Option<DateTime<Utc>>,
    pub left_at: Option<DateTime<Utc>>,
    pub minutes_late: u32,
    pub completion_percent: Option<u32>,
    pub was_kicked: bool,
    pub kicked_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionParticipant {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            status: ParticipantStatus::Registered,
            joined_at: None,
            left_at: None,
            minutes_late: 0,
            completion_percent: None,
            was_kicked: false,
            kicked_at: None,
            cancelled_at: None,
            created_at: Utc::now(),
        }
    }

    /// The slice of a participation the calculator scores against.
    pub fn outcome(&self) -> ParticipantOutcome {
        ParticipantOutcome {
            status: self.status,
            minutes_late: self.minutes_late,
            completion_percent: self.completion_percent,
            was_kicked: self.was_kicked,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParticipantOutcome {
    pub status: ParticipantStatus,
    pub minutes_late: u32,
    pub completion_percent: Option<u32>,
    pub was_kicked: bool,
}

/// Aggregate participation counts for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total: usize,
    pub joined: usize,
    pub no_shows: usize,
    pub completed: usize,
    pub left_early: usize,
    pub kicked: usize,
    pub late: usize,
}
