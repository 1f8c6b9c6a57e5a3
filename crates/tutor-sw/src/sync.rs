//! Background sync.
//!
//! Replaying submissions queued while offline belongs to the application;
//! the worker only routes the sync tag to a [`SyncHandler`].

use futures::future::BoxFuture;
use tracing::info;

use crate::SwError;

/// Replays work queued while offline.
pub trait SyncHandler: Send + Sync {
    fn sync<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, Result<(), SwError>>;
}

/// Default handler: nothing is queued, so there is nothing to replay.
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingSubmissions;

impl SyncHandler for PendingSubmissions {
    fn sync<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, Result<(), SwError>> {
        Box::pin(async move {
            info!(tag, "Syncing offline submissions");
            Ok(())
        })
    }
}

/// What a sync event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Tag matched and the handler finished.
    Completed,
    /// Tag is not ours.
    Ignored,
}
