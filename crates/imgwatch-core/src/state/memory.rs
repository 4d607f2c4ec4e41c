// # Memory Snapshot Store
//
// In-memory implementation of SnapshotStore.
//
// ## Purpose
//
// Provides a store that doesn't persist across restarts. Useful for tests
// and for embedding the engine where persistence isn't wanted.
//
// ## Crash Behavior
//
// All state is lost on restart, so the first cycle after a restart is
// treated as a first run: the fetched image counts as changed and a
// notification goes out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::snapshot::ImageSnapshot;
use crate::traits::SnapshotStore;

/// In-memory snapshot store implementation
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    inner: Arc<RwLock<Option<ImageSnapshot>>>,
}

impl MemorySnapshotStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the store currently holds a snapshot
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<ImageSnapshot>> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, snapshot: &ImageSnapshot) -> Result<()> {
        *self.inner.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.inner.write().await = None;
        Ok(())
    }
}
