use chrono::{DateTime, Duration, Utc};

use crate::config::DecayConfig;
use crate::event::ReputationEvent;

/// Ages events out of full weight. The reduced delta is frozen on the event
/// the first time it crosses the threshold and reused ever after.
#[derive(Debug, Clone)]
pub struct DecayPolicy {
    days: i64,
    weight: f64,
}

impl DecayPolicy {
    pub fn new(days: i64, weight: f64) -> Self {
        Self { days, weight }
    }

    pub fn from_config(config: &DecayConfig) -> Self {
        Self::new(config.days, config.weight)
    }

    /// True when the event is past the age threshold and not yet frozen.
    pub fn is_stale(&self, event: &ReputationEvent, now: DateTime<Utc>) -> bool {
        !event.decay_applied && now - event.created_at > Duration::days(self.days)
    }

    /// One-way transition: records the reduced delta and marks the event.
    pub fn freeze(&self, event: &mut ReputationEvent) {
        event.decayed_score = Some(event.score_change * self.weight);
        event.decay_applied = true;
    }
}
