use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::ReputationConfig;
use crate::error::{ReputationError, Result};
use crate::event::{Endorsement, EventType, Report, ReportReason, ReputationEvent};
use crate::reputation::{Reputation, ReputationDisplay};
use crate::scoring::ScoreRecalculator;
use crate::session::{ParticipantOutcome, ParticipantStatus};
use crate::store::ReputationStore;

/// Orchestrates the reputation engine: turns domain occurrences (session
/// outcomes, endorsements, reports, cancellations, seasonal resets) into
/// ledger events and triggers recalculation.
///
/// Every mutating operation is serialized per user through a lock table, so
/// a recalculation always incorporates all events written before it started.
pub struct ReputationCalculator<S> {
    store: Arc<S>,
    config: ReputationConfig,
    recalc: ScoreRecalculator,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: ReputationStore> ReputationCalculator<S> {
    pub fn new(store: Arc<S>, config: ReputationConfig) -> Self {
        let recalc = ScoreRecalculator::new(&config);
        Self {
            store,
            config,
            recalc,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_or_create_reputation(&self, user_id: &str) -> Result<Reputation> {
        if let Some(reputation) = self.store.get_reputation(user_id)? {
            return Ok(reputation);
        }
        let reputation = Reputation::new(user_id, self.config.bounds.base);
        self.store.put_reputation(&reputation)?;
        debug!(user_id, "initialized reputation at base score");
        Ok(reputation)
    }

    /// Scores one participant's final session outcome. Returns the net delta
    /// written to the ledger (0.0 when everything was suppressed by grace).
    pub fn record_session_completion(
        &self,
        user_id: &str,
        session_id: &str,
        outcome: &ParticipantOutcome,
    ) -> Result<f64> {
        let lock = self.user_lock(user_id)?;
        let _guard = hold(&lock)?;

        let mut reputation = self.get_or_create_reputation(user_id)?;
        let in_grace = reputation.in_grace_period(self.config.grace.sessions);
        let deltas = &self.config.deltas;
        let thresholds = &self.config.thresholds;

        let mut events: Vec<(EventType, f64, String)> = Vec::new();
        let completion = outcome.completion_percent.unwrap_or(100);

        if outcome.status == ParticipantStatus::NoShow {
            if !in_grace {
                events.push((
                    EventType::NoShow,
                    deltas.no_show,
                    "Did not show up for session".to_string(),
                ));
            }
        } else if outcome.was_kicked {
            if !in_grace {
                events.push((
                    EventType::KickedFromGroup,
                    deltas.kicked_from_group,
                    "Kicked from session".to_string(),
                ));
            }
        } else if outcome.status == ParticipantStatus::Completed {
            if completion < thresholds.completion_percent {
                if !in_grace {
                    events.push((
                        EventType::EarlyLeave,
                        deltas.early_leave,
                        format!("Left early ({}% completion)", completion),
                    ));
                }
            } else {
                events.push((
                    EventType::SessionCompleted,
                    deltas.session_completed,
                    "Completed session".to_string(),
                ));

                if outcome.minutes_late == 0 {
                    events.push((
                        EventType::SessionOnTime,
                        deltas.session_on_time,
                        "Arrived on time".to_string(),
                    ));
                } else if outcome.minutes_late >= thresholds.late_min
                    && outcome.minutes_late <= thresholds.late_max
                {
                    // Between 0 and late_min, or past late_max, neither the
                    // bonus nor the penalty applies.
                    if !in_grace {
                        events.push((
                            EventType::LateArrival,
                            deltas.late_arrival,
                            format!("Arrived {} minutes late", outcome.minutes_late),
                        ));
                    }
                }

                let new_streak = reputation.current_streak + 1;
                if new_streak % 10 == 0 {
                    events.push((
                        EventType::StreakBonus,
                        deltas.streak_bonus,
                        format!("{} session streak!", new_streak),
                    ));
                }

                reputation.current_streak = new_streak;
                reputation.longest_streak = reputation.longest_streak.max(new_streak);
                reputation.good_sessions_bank += 1;
            }
        }

        let mut total_change = 0.0;
        for (event_type, change, reason) in events {
            total_change += change;
            self.store.append_event(&ReputationEvent::new(
                user_id,
                event_type,
                change,
                reason,
                Some(session_id.to_string()),
            ))?;
        }

        // Aggregate counters advance regardless of grace suppression.
        reputation.total_sessions += 1;
        if outcome.status == ParticipantStatus::Completed {
            reputation.completed_sessions += 1;
        }
        if outcome.status == ParticipantStatus::NoShow {
            reputation.no_shows += 1;
        }
        if outcome.minutes_late >= thresholds.late_min {
            reputation.late_arrivals += 1;
        }
        if completion < thresholds.completion_percent {
            reputation.early_leaves += 1;
        }
        if in_grace {
            reputation.grace_sessions += 1;
            if reputation.grace_sessions >= self.config.grace.sessions {
                reputation.is_grace_period = false;
            }
        }
        let now = Utc::now();
        reputation.last_session_at = Some(now);
        reputation.updated_at = now;
        self.store.put_reputation(&reputation)?;

        let score = self.recalculate_locked(user_id)?;
        info!(
            user_id,
            session_id,
            status = ?outcome.status,
            total_change,
            score,
            "recorded session completion"
        );
        Ok(total_change)
    }

    /// Records a host endorsement of `receiver_id`. Self-endorsement and
    /// duplicate (giver, receiver, session) triples are rejected before any
    /// state change.
    pub fn record_endorsement(
        &self,
        giver_id: &str,
        receiver_id: &str,
        session_id: Option<&str>,
    ) -> Result<Endorsement> {
        if giver_id == receiver_id {
            return Err(ReputationError::Validation(
                "cannot endorse yourself".to_string(),
            ));
        }

        let lock = self.user_lock(receiver_id)?;
        let _guard = hold(&lock)?;

        let endorsement = Endorsement::new(
            giver_id,
            receiver_id,
            session_id.map(str::to_string),
            self.config.deltas.host_endorsement,
        );
        self.store.insert_endorsement(&endorsement)?;

        self.get_or_create_reputation(receiver_id)?;
        self.store.append_event(&ReputationEvent::new(
            receiver_id,
            EventType::HostEndorsement,
            self.config.deltas.host_endorsement,
            "Received host endorsement",
            session_id.map(str::to_string),
        ))?;

        let score = self.recalculate_locked(receiver_id)?;
        info!(giver_id, receiver_id, score, "recorded endorsement");
        Ok(endorsement)
    }

    /// Persists a report unconditionally; toxic-behavior and harassment
    /// reasons additionally penalize the reported user.
    pub fn record_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: ReportReason,
        details: Option<String>,
        session_id: Option<&str>,
    ) -> Result<Report> {
        if reporter_id == reported_id {
            return Err(ReputationError::Validation(
                "cannot report yourself".to_string(),
            ));
        }

        let report = Report::new(
            reporter_id,
            reported_id,
            reason,
            details.clone(),
            session_id.map(str::to_string),
        );
        self.store.insert_report(&report)?;

        if reason.is_toxic() {
            let lock = self.user_lock(reported_id)?;
            let _guard = hold(&lock)?;

            self.get_or_create_reputation(reported_id)?;
            self.store.append_event(&ReputationEvent::new(
                reported_id,
                EventType::ToxicBehavior,
                self.config.deltas.toxic_behavior,
                details.unwrap_or_else(|| "Reported for toxic behavior".to_string()),
                session_id.map(str::to_string),
            ))?;
            let score = self.recalculate_locked(reported_id)?;
            info!(reported_id, score, "applied toxic behavior penalty");
        }

        Ok(report)
    }

    /// Scores a cancellation `hours_before_start` ahead of the scheduled
    /// start. Inside the window: penalty event, cancellation counter, streak
    /// reset. At or past the window nothing is written here; the lifecycle
    /// layer still records the cancellation itself. Returns whether the
    /// penalty applied.
    pub fn record_cancellation(
        &self,
        user_id: &str,
        session_id: &str,
        hours_before_start: f64,
    ) -> Result<bool> {
        let lock = self.user_lock(user_id)?;
        let _guard = hold(&lock)?;

        let mut reputation = self.get_or_create_reputation(user_id)?;
        if hours_before_start >= self.config.thresholds.cancel_window_hours {
            return Ok(false);
        }

        self.store.append_event(&ReputationEvent::new(
            user_id,
            EventType::Cancellation,
            self.config.deltas.cancellation,
            format!("Cancelled {:.1}h before session", hours_before_start),
            Some(session_id.to_string()),
        ))?;

        reputation.cancellations += 1;
        reputation.current_streak = 0;
        reputation.updated_at = Utc::now();
        self.store.put_reputation(&reputation)?;

        let score = self.recalculate_locked(user_id)?;
        info!(
            user_id,
            session_id, hours_before_start, score, "applied cancellation penalty"
        );
        Ok(true)
    }

    /// Drifts the score a fraction of the way toward the seasonal target and
    /// records the applied delta as a SEASONAL_RESET event.
    pub fn apply_seasonal_reset(&self, user_id: &str, drift_factor: f64) -> Result<f64> {
        let lock = self.user_lock(user_id)?;
        let _guard = hold(&lock)?;

        let mut reputation = self.get_or_create_reputation(user_id)?;
        let target = self.config.seasonal.drift_target;
        let new_score = reputation.current_score
            + (target - reputation.current_score) * drift_factor;

        self.store.append_event(&ReputationEvent::new(
            user_id,
            EventType::SeasonalReset,
            new_score - reputation.current_score,
            "Seasonal soft reset",
            None,
        ))?;

        reputation.current_score = new_score;
        reputation.updated_at = Utc::now();
        self.store.put_reputation(&reputation)?;
        info!(user_id, new_score, "applied seasonal reset");
        Ok(new_score)
    }

    /// Recomputes and persists the aggregate score from the full ledger.
    pub fn recalculate_score(&self, user_id: &str) -> Result<f64> {
        let lock = self.user_lock(user_id)?;
        let _guard = hold(&lock)?;
        self.recalculate_locked(user_id)
    }

    pub fn reputation_display(&self, user_id: &str) -> Result<ReputationDisplay> {
        let lock = self.user_lock(user_id)?;
        let _guard = hold(&lock)?;
        Ok(self.get_or_create_reputation(user_id)?.display())
    }

    /// Caller must hold the user's lock. The pipeline runs entirely against
    /// in-memory copies; nothing is persisted until it has succeeded.
    fn recalculate_locked(&self, user_id: &str) -> Result<f64> {
        let Some(mut reputation) = self.store.get_reputation(user_id)? else {
            return Ok(self.config.bounds.base);
        };

        let mut events = self.store.events_newest_first(user_id)?;
        let outcome = self
            .recalc
            .run(&mut events, reputation.good_sessions_bank, Utc::now());

        for index in &outcome.touched {
            self.store.update_event(&events[*index])?;
        }

        reputation.good_sessions_bank = outcome.bank_remaining;
        reputation.current_score = outcome.score;
        reputation.updated_at = Utc::now();
        self.store.put_reputation(&reputation)?;
        debug!(user_id, score = outcome.score, "recalculated score");
        Ok(outcome.score)
    }

    fn user_lock(&self, user_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut guard = self
            .locks
            .lock()
            .map_err(|_| ReputationError::Storage("lock table poisoned".to_string()))?;
        Ok(guard
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}

fn hold(lock: &Arc<Mutex<()>>) -> Result<MutexGuard<'_, ()>> {
    lock.lock()
        .map_err(|_| ReputationError::Storage("user lock poisoned".to_string()))
}
