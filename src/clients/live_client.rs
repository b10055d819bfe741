use crate::framework::{FrameworkError, LiveClient, LiveEntity, LiveState};
use async_trait::async_trait;

/// Trait for record-specific tracker clients to inherit the standard operations.
///
/// This trait reduces boilerplate by providing default implementations for
/// `snapshot` and `close` on top of the generic [`LiveClient`].
#[async_trait]
pub trait TrackedClient<T: LiveEntity>: Send + Sync {
    /// The record-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic LiveClient.
    fn inner(&self) -> &LiveClient<T>;

    /// Map framework errors to the specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Current state as held by the actor.
    #[tracing::instrument(skip(self))]
    async fn snapshot(&self) -> Result<LiveState<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().snapshot().await.map_err(Self::map_error)
    }

    /// Releases the subscription and stops the actor.
    #[tracing::instrument(skip(self))]
    async fn close(&self) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().close().await.map_err(Self::map_error)
    }
}
