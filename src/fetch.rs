use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{ChangeEvent, Cursor, WatchTarget};

/// Options for a single long-poll request against the store.
///
/// Fields which are `None` must be left out of the request entirely,
/// rather than sent as a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FetchOptions {
    /// Hold the request open until a qualifying change exists.
    pub wait: bool,
    /// Lower bound for the change version.
    pub wait_index: Option<u64>,
    /// Match the key and everything nested under it.
    pub recursive: Option<bool>,
}

impl FetchOptions {
    /// Options for a blocking watch on `target` starting at `cursor`.
    ///
    /// A zero cursor carries no lower bound at all.
    pub fn watch(target: &WatchTarget, cursor: Cursor) -> Self {
        Self {
            wait: true,
            wait_index: (cursor > 0).then_some(cursor),
            recursive: target.recursive.then_some(true),
        }
    }
}

/// Transport to a versioned key-value store.
///
/// Implementations own retries, leader redirects and response parsing. A call
/// may block for as long as the store's long-poll window, but must eventually
/// resolve to either an event or an error.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<ChangeEvent, Self::Error>;
}

#[async_trait]
impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    type Error = F::Error;

    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<ChangeEvent, Self::Error> {
        (**self).fetch(key, options).await
    }
}
