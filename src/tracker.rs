use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::calculator::ReputationCalculator;
use crate::error::{ReputationError, Result};
use crate::session::{
    ParticipantStatus, Session, SessionParticipant, SessionStats, SessionStatus,
};
use crate::store::{ReputationStore, SessionStore};

/// Outcome of a participant cancelling their registration.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CancellationOutcome {
    pub hours_before_start: f64,
    pub penalty_applied: bool,
}

/// Drives sessions and their participants through the lifecycle
/// (scheduled → in-progress → completed) and classifies each participant's
/// final outcome when the session closes.
pub struct SessionTracker<S> {
    store: Arc<S>,
    calculator: Arc<ReputationCalculator<S>>,
}

impl<S: SessionStore + ReputationStore> SessionTracker<S> {
    pub fn new(store: Arc<S>, calculator: Arc<ReputationCalculator<S>>) -> Self {
        Self { store, calculator }
    }

    pub fn create_session(
        &self,
        host_id: &str,
        title: &str,
        scheduled_start: chrono::DateTime<Utc>,
        scheduled_end: Option<chrono::DateTime<Utc>>,
    ) -> Result<Session> {
        let session = Session::new(host_id, title, scheduled_start, scheduled_end);
        self.store.insert_session(&session)?;
        info!(session_id = %session.id, host_id, "created session");
        Ok(session)
    }

    pub fn add_participant(&self, session_id: &str, user_id: &str) -> Result<SessionParticipant> {
        self.get_session(session_id)?;
        let participant = SessionParticipant::new(session_id, user_id);
        self.store.insert_participant(&participant)?;
        Ok(participant)
    }

    /// Records the actual start time. Fails unless the session is SCHEDULED.
    pub fn start_session(&self, session_id: &str) -> Result<Session> {
        let mut session = self.get_session(session_id)?;
        if session.status != SessionStatus::Scheduled {
            return Err(ReputationError::Precondition(format!(
                "session {} is not in SCHEDULED state",
                session_id
            )));
        }
        session.status = SessionStatus::InProgress;
        session.actual_start = Some(Utc::now());
        self.store.update_session(&session)?;
        info!(session_id, "session started");
        Ok(session)
    }

    /// Marks a participant present. Minutes late counts from the scheduled
    /// start, floored at zero for anyone early.
    pub fn mark_participant_joined(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<SessionParticipant> {
        let session = self.get_session(session_id)?;
        if session.actual_start.is_none() {
            return Err(ReputationError::Precondition(
                "session has not started yet".to_string(),
            ));
        }

        let now = Utc::now();
        let minutes_late = (now - session.scheduled_start).num_minutes().max(0) as u32;

        let mut participant = self.get_participant(session_id, user_id)?;
        participant.status = ParticipantStatus::Joined;
        participant.joined_at = Some(now);
        participant.minutes_late = minutes_late;
        self.store.update_participant(&participant)?;
        Ok(participant)
    }

    pub fn mark_participant_left_early(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<SessionParticipant> {
        let mut participant = self.get_participant(session_id, user_id)?;
        participant.status = ParticipantStatus::LeftEarly;
        participant.left_at = Some(Utc::now());
        self.store.update_participant(&participant)?;
        Ok(participant)
    }

    pub fn kick_participant(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<SessionParticipant> {
        let mut participant = self.get_participant(session_id, user_id)?;
        participant.status = ParticipantStatus::Kicked;
        participant.was_kicked = true;
        participant.kicked_at = Some(Utc::now());
        self.store.update_participant(&participant)?;
        info!(session_id, user_id, "participant kicked");
        Ok(participant)
    }

    /// Cancels a registration. Cancelling inside the penalty window costs
    /// reputation and breaks the streak; earlier cancellations are free but
    /// still recorded on the participant.
    pub fn cancel_participant(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<CancellationOutcome> {
        let session = self.get_session(session_id)?;
        let now = Utc::now();
        let hours_before_start =
            (session.scheduled_start - now).num_seconds() as f64 / 3600.0;

        let mut participant = self.get_participant(session_id, user_id)?;
        participant.status = ParticipantStatus::Cancelled;
        participant.cancelled_at = Some(now);
        self.store.update_participant(&participant)?;

        let penalty_applied =
            self.calculator
                .record_cancellation(user_id, session_id, hours_before_start)?;

        Ok(CancellationOutcome {
            hours_before_start,
            penalty_applied,
        })
    }

    /// Closes the session and classifies every participant, in order:
    /// never joined → NO_SHOW; left → LEFT_EARLY with time-based completion;
    /// kicked → KICKED; otherwise COMPLETED. Each final outcome is persisted
    /// and scored.
    pub fn complete_session(&self, session_id: &str) -> Result<Session> {
        let mut session = self.get_session(session_id)?;
        session.status = SessionStatus::Completed;
        session.actual_end = Some(Utc::now());

        let (Some(actual_start), Some(actual_end)) = (session.actual_start, session.actual_end)
        else {
            return Err(ReputationError::Precondition(
                "session must have start and end times".to_string(),
            ));
        };
        let duration_ms = (actual_end - actual_start).num_milliseconds();
        if duration_ms <= 0 {
            return Err(ReputationError::Precondition(
                "session duration must be positive".to_string(),
            ));
        }
        self.store.update_session(&session)?;

        for mut participant in self.store.session_participants(session_id)? {
            let completion_percent;
            if participant.joined_at.is_none() {
                participant.status = ParticipantStatus::NoShow;
                completion_percent = 0;
            } else if let (Some(joined_at), Some(left_at)) =
                (participant.joined_at, participant.left_at)
            {
                let time_in_session = (left_at - joined_at).num_milliseconds().max(0);
                completion_percent =
                    ((time_in_session as f64 / duration_ms as f64) * 100.0).floor() as u32;
                participant.status = ParticipantStatus::LeftEarly;
            } else if participant.was_kicked {
                participant.status = ParticipantStatus::Kicked;
                completion_percent = participant.completion_percent.unwrap_or(0);
            } else {
                participant.status = ParticipantStatus::Completed;
                completion_percent = participant.completion_percent.unwrap_or(100);
            }

            participant.completion_percent = Some(completion_percent);
            self.store.update_participant(&participant)?;

            self.calculator.record_session_completion(
                &participant.user_id,
                session_id,
                &participant.outcome(),
            )?;
        }

        info!(session_id, "session completed");
        Ok(session)
    }

    pub fn session_stats(&self, session_id: &str) -> Result<SessionStats> {
        let participants = self.store.session_participants(session_id)?;
        let mut stats = SessionStats {
            total: participants.len(),
            ..SessionStats::default()
        };
        for participant in &participants {
            if participant.joined_at.is_some() {
                stats.joined += 1;
            }
            match participant.status {
                ParticipantStatus::NoShow => stats.no_shows += 1,
                ParticipantStatus::Completed => stats.completed += 1,
                ParticipantStatus::LeftEarly => stats.left_early += 1,
                _ => {}
            }
            if participant.was_kicked {
                stats.kicked += 1;
            }
            if participant.minutes_late > 0 {
                stats.late += 1;
            }
        }
        Ok(stats)
    }

    pub fn user_session_history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionParticipant>> {
        self.store.user_participations(user_id, limit)
    }

    fn get_session(&self, session_id: &str) -> Result<Session> {
        self.store
            .get_session(session_id)?
            .ok_or_else(|| ReputationError::NotFound(format!("session {}", session_id)))
    }

    fn get_participant(&self, session_id: &str, user_id: &str) -> Result<SessionParticipant> {
        self.store
            .get_participant(session_id, user_id)?
            .ok_or_else(|| {
                ReputationError::NotFound(format!(
                    "participant {} in session {}",
                    user_id, session_id
                ))
            })
    }
}
