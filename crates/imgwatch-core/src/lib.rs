// # imgwatch-core
//
// Core library for the imgwatch image-change watchdog.
//
// ## Architecture Overview
//
// This library provides the core functionality for monitoring a remote image:
// - **ImageSource**: Trait for fetching the image and computing its digest
// - **Notifier**: Trait for delivering best-effort notifications
// - **SnapshotStore**: Trait for persisting the last observed snapshot
// - **Watchdog**: Engine that runs the fetch → compare → notify → persist loop
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core loop logic is separate from transports
// 2. **Error Containment**: Nothing inside a poll cycle escalates past it
// 3. **Library-First**: The engine can be embedded with custom collaborators
// 4. **Single Writer**: Exactly one poll cycle is in flight at a time

pub mod config;
pub mod engine;
pub mod error;
pub mod snapshot;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::WatchConfig;
pub use engine::{CycleOutcome, Watchdog, WatchdogEvent};
pub use error::{Error, Result};
pub use snapshot::ImageSnapshot;
pub use state::{FileSnapshotStore, MemorySnapshotStore};
pub use traits::{ImageSource, Notifier, SnapshotStore};
