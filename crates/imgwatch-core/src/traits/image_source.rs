// # Image Source Trait
//
// Defines the interface for retrieving the monitored image.
//
// ## Implementations
//
// - HTTP-based: `imgwatch-fetch-http` crate
//
// ## Responsibilities
//
// An image source performs exactly one outbound retrieval per `fetch()` call
// and returns a complete [`ImageSnapshot`]. It must NOT:
//
// - Retry failed fetches (a failed fetch aborts the current cycle only;
//   the engine simply tries again on the next tick)
// - Cache or compare snapshots (owned by the engine and the store)
// - Spawn background tasks (the engine owns all scheduling)
//
// Network calls must carry their own bounded timeout, independent of the
// poll interval.

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::ImageSnapshot;

/// Trait for image source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Retrieve the image and digest it into a fresh snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(ImageSnapshot)`: content, digest and timestamp of this retrieval
    /// - `Err(Error::FetchStatus)`: the server answered with a non-success status
    /// - `Err(Error::FetchTransport)`: the request failed below HTTP (DNS,
    ///   TLS, connect, timeout)
    async fn fetch(&self) -> Result<ImageSnapshot>;
}
