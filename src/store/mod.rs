pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::event::{Endorsement, Report, ReputationEvent};
use crate::reputation::Reputation;
use crate::session::{Session, SessionParticipant};

/// Storage port for reputation state. The engine only ever talks to these
/// traits; adapters decide where the data actually lives.
pub trait ReputationStore: Send + Sync {
    fn get_reputation(&self, user_id: &str) -> Result<Option<Reputation>>;

    fn put_reputation(&self, reputation: &Reputation) -> Result<()>;

    fn append_event(&self, event: &ReputationEvent) -> Result<()>;

    /// A user's full ledger, newest first.
    fn events_newest_first(&self, user_id: &str) -> Result<Vec<ReputationEvent>>;

    /// Persists the one-way decay/forgiveness transitions on an existing event.
    fn update_event(&self, event: &ReputationEvent) -> Result<()>;

    /// Fails with `DuplicateEndorsement` when the (giver, receiver, session)
    /// triple already exists.
    fn insert_endorsement(&self, endorsement: &Endorsement) -> Result<()>;

    fn insert_report(&self, report: &Report) -> Result<()>;
}

pub trait SessionStore: Send + Sync {
    fn insert_session(&self, session: &Session) -> Result<()>;

    fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    fn update_session(&self, session: &Session) -> Result<()>;

    fn insert_participant(&self, participant: &SessionParticipant) -> Result<()>;

    fn get_participant(&self, session_id: &str, user_id: &str)
        -> Result<Option<SessionParticipant>>;

    fn update_participant(&self, participant: &SessionParticipant) -> Result<()>;

    fn session_participants(&self, session_id: &str) -> Result<Vec<SessionParticipant>>;

    /// A user's participations, most recent first, capped at `limit`.
    fn user_participations(&self, user_id: &str, limit: usize)
        -> Result<Vec<SessionParticipant>>;
}
