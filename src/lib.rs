pub mod calculator;
pub mod config;
pub mod error;
pub mod event;
pub mod reputation;
pub mod scoring;
pub mod session;
pub mod store;
pub mod tracker;

pub use calculator::ReputationCalculator;
pub use config::ReputationConfig;
pub use error::{ReputationError, Result};
pub use event::{Endorsement, EventType, Report, ReportReason, ReputationEvent};
pub use reputation::{Reputation, ReputationDisplay, ReputationStats};
pub use session::{
    ParticipantOutcome, ParticipantStatus, Session, SessionParticipant, SessionStats,
    SessionStatus,
};
pub use store::{MemoryStore, ReputationStore, SessionStore};
pub use tracker::{CancellationOutcome, SessionTracker};
