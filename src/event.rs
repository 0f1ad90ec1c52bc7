use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    SessionCompleted,
    SessionOnTime,
    LateArrival,
    NoShow,
    EarlyLeave,
    KickedFromGroup,
    Cancellation,
    HostEndorsement,
    ToxicBehavior,
    StreakBonus,
    SeasonalReset,
}

/// One scoring occurrence in a user's ledger. Append-only, except for two
/// one-way transitions: the decay freeze (`decay_applied` + `decayed_score`
/// are set at most once) and the forgiveness mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub id: String,
    pub user_id: String,
    pub event_type: EventType,
    /// Signed delta as originally computed.
    pub score_change: f64,
    pub reason: String,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decay_applied: bool,
    /// Frozen reduced delta, set once when the event ages past the decay
    /// threshold and never recomputed afterward.
    pub decayed_score: Option<f64>,
    /// Set when a good-session credit cancelled this penalty.
    pub forgiven: bool,
}

impl ReputationEvent {
    pub fn new(
        user_id: impl Into<String>,
        event_type: EventType,
        score_change: f64,
        reason: impl Into<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: generate_id("evt"),
            user_id: user_id.into(),
            event_type,
            score_change,
            reason: reason.into(),
            session_id,
            created_at: Utc::now(),
            decay_applied: false,
            decayed_score: None,
            forgiven: false,
        }
    }

    /// The delta this event currently contributes to the aggregate score.
    pub fn effective_score(&self) -> f64 {
        if self.forgiven {
            return 0.0;
        }
        if self.decay_applied {
            return self.decayed_score.unwrap_or(self.score_change);
        }
        self.score_change
    }

    pub fn is_penalty(&self) -> bool {
        self.score_change < 0.0
    }
}

/// A host-issued credit toward another user, unique per
/// (giver, receiver, session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: String,
    pub giver_id: String,
    pub receiver_id: String,
    pub session_id: Option<String>,
    pub value: f64,
    pub created_at: DateTime<Utc>,
}

impl Endorsement {
    pub fn new(
        giver_id: impl Into<String>,
        receiver_id: impl Into<String>,
        session_id: Option<String>,
        value: f64,
    ) -> Self {
        Self {
            id: generate_id("end"),
            giver_id: giver_id.into(),
            receiver_id: receiver_id.into(),
            session_id,
            value,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportReason {
    ToxicBehavior,
    Harassment,
    Cheating,
    Griefing,
    Spam,
    Other,
}

impl ReportReason {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "TOXIC_BEHAVIOR" => Some(ReportReason::ToxicBehavior),
            "HARASSMENT" => Some(ReportReason::Harassment),
            "CHEATING" => Some(ReportReason::Cheating),
            "GRIEFING" => Some(ReportReason::Griefing),
            "SPAM" => Some(ReportReason::Spam),
            "OTHER" => Some(ReportReason::Other),
            _ => None,
        }
    }

    /// Only these reasons carry an immediate score penalty.
    pub fn is_toxic(self) -> bool {
        matches!(self, ReportReason::ToxicBehavior | ReportReason::Harassment)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn new(
        reporter_id: impl Into<String>,
        reported_id: impl Into<String>,
        reason: ReportReason,
        details: Option<String>,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: generate_id("rep"),
            reporter_id: reporter_id.into(),
            reported_id: reported_id.into(),
            reason,
            details,
            session_id,
            created_at: Utc::now(),
        }
    }
}

static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Timestamp+counter ids, unique within a process run.
pub fn generate_id(prefix: &str) -> String {
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), counter)
}
