use crate::event::ReputationEvent;

/// Picks the penalties a good-session bank can cancel: the most recent
/// negative events that are neither decayed nor already forgiven, up to the
/// bank size. `events` must be ordered newest first; returns indices into it.
///
/// Forgiven events are marked by the caller, so a penalty offset once stays
/// offset and is never selected again by a later recalculation.
pub fn select_forgivable(events: &[ReputationEvent], bank: u32) -> Vec<usize> {
    if bank == 0 {
        return Vec::new();
    }
    events
        .iter()
        .enumerate()
        .filter(|(_, event)| event.is_penalty() && !event.decay_applied && !event.forgiven)
        .map(|(index, _)| index)
        .take(bank as usize)
        .collect()
}
