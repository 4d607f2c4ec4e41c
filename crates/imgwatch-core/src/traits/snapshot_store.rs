// # Snapshot Store Trait
//
// Defines the interface for persisting the last observed snapshot.
//
// ## Purpose
//
// The store carries the baseline the next poll cycle compares against. It
// holds at most one snapshot; a save supersedes whatever was there before.
//
// ## Absence vs. Failure
//
// "Nothing stored yet" is a valid result (`Ok(None)`), not an error. This
// distinction carries the first-run semantics: an absent baseline makes the
// change detector report a change unconditionally. `Store` errors are
// reserved for real I/O or deserialization faults.
//
// ## Implementations
//
// - File-based: [`FileSnapshotStore`](crate::state::FileSnapshotStore)
// - In-memory: [`MemorySnapshotStore`](crate::state::MemorySnapshotStore)

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::ImageSnapshot;

/// Trait for snapshot store implementations
///
/// The sequential poll loop is the only writer, so implementations need no
/// locking beyond what keeps a concurrent `load` from observing a partially
/// written snapshot.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last persisted snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ImageSnapshot))`: the stored baseline
    /// - `Ok(None)`: nothing stored yet (first run)
    /// - `Err(Error::Store)`: I/O or deserialization fault
    async fn load(&self) -> Result<Option<ImageSnapshot>>;

    /// Persist a snapshot, superseding any previous one
    ///
    /// Creates the storage location if absent. Must be atomic enough that a
    /// concurrent `load` never observes a partially written snapshot.
    async fn save(&self, snapshot: &ImageSnapshot) -> Result<()>;

    /// Remove the persisted snapshot
    ///
    /// Already-absent state is success, not an error.
    async fn delete(&self) -> Result<()>;
}
