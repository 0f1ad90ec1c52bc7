use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user reputation aggregate. Created lazily on the first scoring event;
/// mutated only by the calculator and the score recalculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reputation {
    pub user_id: String,
    pub current_score: f64,
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub no_shows: u32,
    pub late_arrivals: u32,
    pub early_leaves: u32,
    pub cancellations: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub is_grace_period: bool,
    /// Grace sessions consumed so far.
    pub grace_sessions: u32,
    /// Uncommitted good-session credits available to offset penalties.
    pub good_sessions_bank: u32,
    pub last_session_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reputation {
    pub fn new(user_id: impl Into<String>, base_score: f64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            current_score: base_score,
            total_sessions: 0,
            completed_sessions: 0,
            no_shows: 0,
            late_arrivals: 0,
            early_leaves: 0,
            cancellations: 0,
            current_streak: 0,
            longest_streak: 0,
            is_grace_period: true,
            grace_sessions: 0,
            good_sessions_bank: 0,
            last_session_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether negative session events are still suppressed for this user.
    pub fn in_grace_period(&self, grace_limit: u32) -> bool {
        self.is_grace_period && self.grace_sessions < grace_limit
    }

    pub fn display(&self) -> ReputationDisplay {
        let stars = self.current_score.round().clamp(0.0, 5.0) as u8;
        let star_glyphs = "⭐".repeat(stars as usize);
        ReputationDisplay {
            score: self.current_score,
            stars,
            total_games: self.total_sessions,
            display: format!(
                "{} {:.1} ({} games)",
                star_glyphs, self.current_score, self.total_sessions
            ),
            stats: ReputationStats {
                completed: self.completed_sessions,
                no_shows: self.no_shows,
                late_arrivals: self.late_arrivals,
                current_streak: self.current_streak,
                longest_streak: self.longest_streak,
            },
        }
    }
}

/// Read-only human-facing projection. No mutation; safe to build on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationDisplay {
    pub score: f64,
    pub stars: u8,
    pub total_games: u32,
    pub display: String,
    pub stats: ReputationStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationStats {
    pub completed: u32,
    pub no_shows: u32,
    pub late_arrivals: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
}
