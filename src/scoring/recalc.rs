use chrono::{DateTime, Utc};

use crate::config::{ReputationConfig, ScoreBounds};
use crate::event::ReputationEvent;
use crate::scoring::{select_forgivable, DecayPolicy};

/// Result of one recalculation pass. `touched` indexes the events whose
/// decay/forgiveness flags changed and must be written back.
#[derive(Debug, Clone)]
pub struct RecalcOutcome {
    pub score: f64,
    pub bank_remaining: u32,
    pub touched: Vec<usize>,
}

/// Recomputes the aggregate score from a user's full ledger: decay pass,
/// forgiveness pass, clamp. Pure with respect to storage — it mutates the
/// event copies it is handed and leaves persistence to the caller, so a
/// failure partway through never leaves a half-written score behind.
#[derive(Debug, Clone)]
pub struct ScoreRecalculator {
    bounds: ScoreBounds,
    decay: DecayPolicy,
}

impl ScoreRecalculator {
    pub fn new(config: &ReputationConfig) -> Self {
        Self {
            bounds: config.bounds.clone(),
            decay: DecayPolicy::from_config(&config.decay),
        }
    }

    /// `events` must be ordered newest first.
    pub fn run(&self, events: &mut [ReputationEvent], bank: u32, now: DateTime<Utc>) -> RecalcOutcome {
        let mut touched = Vec::new();

        for (index, event) in events.iter_mut().enumerate() {
            if self.decay.is_stale(event, now) {
                self.decay.freeze(event);
                touched.push(index);
            }
        }

        let forgivable = select_forgivable(events, bank);
        let forgiven_count = forgivable.len() as u32;
        for index in forgivable {
            events[index].forgiven = true;
            if !touched.contains(&index) {
                touched.push(index);
            }
        }

        let mut total = self.bounds.base;
        for event in events.iter() {
            total += event.effective_score();
        }

        RecalcOutcome {
            score: total.clamp(self.bounds.min, self.bounds.max),
            bank_remaining: bank.saturating_sub(forgiven_count),
            touched,
        }
    }
}
