use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{ReputationError, Result};
use crate::event::{Endorsement, Report, ReputationEvent};
use crate::reputation::Reputation;
use crate::session::{Session, SessionParticipant};
use crate::store::{ReputationStore, SessionStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Inner {
    reputations: HashMap<String, Reputation>,
    /// Per-user ledgers in append order (oldest first).
    events: HashMap<String, Vec<ReputationEvent>>,
    endorsements: Vec<Endorsement>,
    reports: Vec<Report>,
    sessions: HashMap<String, Session>,
    /// Keyed by session id.
    participants: HashMap<String, Vec<SessionParticipant>>,
}

/// In-memory adapter for both storage ports, with an optional JSON snapshot
/// written atomically (tmp file + rename) after every mutation.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            snapshot_path: None,
        }
    }

    /// Loads prior state from `path` when present; subsequent mutations are
    /// snapshotted back to the same file.
    pub fn load(path: PathBuf) -> Result<Self> {
        let inner = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .map_err(|err| ReputationError::Storage(format!("failed to read snapshot: {}", err)))?;
            if data.trim().is_empty() {
                Inner::default()
            } else {
                serde_json::from_str(&data).map_err(|err| {
                    ReputationError::Storage(format!("failed to parse snapshot: {}", err))
                })?
            }
        } else {
            Inner::default()
        };

        Ok(Self {
            inner: Mutex::new(inner),
            snapshot_path: Some(path),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ReputationError::Storage("store lock poisoned".to_string()))
    }

    fn persist(&self, inner: &Inner) -> Result<()> {
        let Some(path) = self.snapshot_path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let payload = serde_json::to_string_pretty(inner)
            .map_err(|err| ReputationError::Storage(format!("failed to serialize snapshot: {}", err)))?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)
            .map_err(|err| ReputationError::Storage(format!("failed to write snapshot: {}", err)))?;
        std::fs::rename(&tmp_path, path)
            .map_err(|err| ReputationError::Storage(format!("failed to finalize snapshot: {}", err)))?;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReputationStore for MemoryStore {
    fn get_reputation(&self, user_id: &str) -> Result<Option<Reputation>> {
        let guard = self.lock()?;
        Ok(guard.reputations.get(user_id).cloned())
    }

    fn put_reputation(&self, reputation: &Reputation) -> Result<()> {
        let mut guard = self.lock()?;
        guard
            .reputations
            .insert(reputation.user_id.clone(), reputation.clone());
        self.persist(&guard)
    }

    fn append_event(&self, event: &ReputationEvent) -> Result<()> {
        let mut guard = self.lock()?;
        guard
            .events
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());
        self.persist(&guard)
    }

    fn events_newest_first(&self, user_id: &str) -> Result<Vec<ReputationEvent>> {
        let guard = self.lock()?;
        let mut events: Vec<ReputationEvent> = guard
            .events
            .get(user_id)
            .map(|ledger| ledger.iter().rev().cloned().collect())
            .unwrap_or_default();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    fn update_event(&self, event: &ReputationEvent) -> Result<()> {
        let mut guard = self.lock()?;
        let ledger = guard
            .events
            .get_mut(&event.user_id)
            .ok_or_else(|| ReputationError::NotFound(format!("ledger for {}", event.user_id)))?;
        let slot = ledger
            .iter_mut()
            .find(|candidate| candidate.id == event.id)
            .ok_or_else(|| ReputationError::NotFound(format!("event {}", event.id)))?;
        *slot = event.clone();
        self.persist(&guard)
    }

    fn insert_endorsement(&self, endorsement: &Endorsement) -> Result<()> {
        let mut guard = self.lock()?;
        let duplicate = guard.endorsements.iter().any(|existing| {
            existing.giver_id == endorsement.giver_id
                && existing.receiver_id == endorsement.receiver_id
                && existing.session_id == endorsement.session_id
        });
        if duplicate {
            return Err(ReputationError::DuplicateEndorsement);
        }
        guard.endorsements.push(endorsement.clone());
        self.persist(&guard)
    }

    fn insert_report(&self, report: &Report) -> Result<()> {
        let mut guard = self.lock()?;
        guard.reports.push(report.clone());
        self.persist(&guard)
    }
}

impl SessionStore for MemoryStore {
    fn insert_session(&self, session: &Session) -> Result<()> {
        let mut guard = self.lock()?;
        guard.sessions.insert(session.id.clone(), session.clone());
        self.persist(&guard)
    }

    fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let guard = self.lock()?;
        Ok(guard.sessions.get(session_id).cloned())
    }

    fn update_session(&self, session: &Session) -> Result<()> {
        let mut guard = self.lock()?;
        if !guard.sessions.contains_key(&session.id) {
            return Err(ReputationError::NotFound(format!("session {}", session.id)));
        }
        guard.sessions.insert(session.id.clone(), session.clone());
        self.persist(&guard)
    }

    fn insert_participant(&self, participant: &SessionParticipant) -> Result<()> {
        let mut guard = self.lock()?;
        guard
            .participants
            .entry(participant.session_id.clone())
            .or_default()
            .push(participant.clone());
        self.persist(&guard)
    }

    fn get_participant(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<SessionParticipant>> {
        let guard = self.lock()?;
        Ok(guard
            .participants
            .get(session_id)
            .and_then(|roster| roster.iter().find(|p| p.user_id == user_id))
            .cloned())
    }

    fn update_participant(&self, participant: &SessionParticipant) -> Result<()> {
        let mut guard = self.lock()?;
        let roster = guard
            .participants
            .get_mut(&participant.session_id)
            .ok_or_else(|| {
                ReputationError::NotFound(format!("roster for {}", participant.session_id))
            })?;
        let slot = roster
            .iter_mut()
            .find(|candidate| candidate.user_id == participant.user_id)
            .ok_or_else(|| {
                ReputationError::NotFound(format!(
                    "participant {} in {}",
                    participant.user_id, participant.session_id
                ))
            })?;
        *slot = participant.clone();
        self.persist(&guard)
    }

    fn session_participants(&self, session_id: &str) -> Result<Vec<SessionParticipant>> {
        let guard = self.lock()?;
        Ok(guard
            .participants
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    fn user_participations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionParticipant>> {
        let guard = self.lock()?;
        let mut history: Vec<SessionParticipant> = guard
            .participants
            .values()
            .flatten()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        Ok(history)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .map_err(|err| ReputationError::Storage(format!("failed to create snapshot dir: {}", err)))
}
