//! Core traits for the watchdog
//!
//! This module defines the abstract interfaces the engine orchestrates.
//!
//! - [`ImageSource`]: Fetch the monitored image and compute its digest
//! - [`Notifier`]: Deliver best-effort messages to the notification channel
//! - [`SnapshotStore`]: Persist the last observed snapshot

pub mod image_source;
pub mod notifier;
pub mod snapshot_store;

pub use image_source::ImageSource;
pub use notifier::Notifier;
pub use snapshot_store::SnapshotStore;
