use crate::models::StageSnapshot;

/// Receives a session snapshot after every pipeline stage.
///
/// The streaming HTTP layer implements this to forward `{stage, session}`
/// envelopes; tests implement it to assert on intermediate state.
pub trait ISnapshotObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &StageSnapshot);
}

/// Observer that discards every snapshot.
pub struct NullObserver;

impl ISnapshotObserver for NullObserver {
    fn on_snapshot(&self, _snapshot: &StageSnapshot) {}
}
