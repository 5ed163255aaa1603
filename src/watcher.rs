use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    bridge::DeliveryTx,
    builder::WatcherBuilder,
    diagnostics::{Diagnostic, Mode},
    driver::{Stopped, WatchLoop},
    errors::{InitError, WatchResult},
    events::{ChangeEvent, Cursor, WatchTarget},
    fetch::Fetch,
    futures::ChangeStream,
    shared::Shared,
    task,
};

/// Long-poll watcher over a single store transport.
///
/// Cheap to clone, all clones share the transport and the diagnostic sink.
pub struct Watcher<F> {
    pub(crate) shared: Shared<F>,
}

impl<F> Clone for Watcher<F> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<F> std::fmt::Debug for Watcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("shared", &self.shared)
            .finish()
    }
}

impl<F: Fetch> Watcher<F> {
    pub fn builder(fetcher: F) -> WatcherBuilder<F> {
        WatcherBuilder::new(fetcher)
    }

    pub fn new(fetcher: F) -> Result<Self, InitError> {
        Self::builder(fetcher).build()
    }

    /// Watch a single key.
    ///
    /// Without `delivery` this returns the first change at or after
    /// `start_cursor` (`0` for "the next change from now"). With `delivery`
    /// every change is sent into the channel until the watch fails or is
    /// cancelled, and the error that ended it is returned.
    ///
    /// A full `delivery` channel pauses the watch until the receiver makes
    /// room, for however long that takes. Cancellation is not observed while
    /// waiting there.
    pub async fn watch(
        &self,
        key: impl Into<String>,
        start_cursor: Cursor,
        delivery: Option<&DeliveryTx>,
        cancel: Option<&CancellationToken>,
    ) -> WatchResult<ChangeEvent, F::Error> {
        self.watch_target(WatchTarget::key(key), start_cursor, delivery, cancel)
            .await
    }

    /// Watch `prefix` and every key nested beneath it.
    ///
    /// Behaves like [`watch`][`Self::watch`] otherwise.
    pub async fn watch_all(
        &self,
        prefix: impl Into<String>,
        start_cursor: Cursor,
        delivery: Option<&DeliveryTx>,
        cancel: Option<&CancellationToken>,
    ) -> WatchResult<ChangeEvent, F::Error> {
        self.watch_target(WatchTarget::prefix(prefix), start_cursor, delivery, cancel)
            .await
    }

    pub async fn watch_target(
        &self,
        target: WatchTarget,
        start_cursor: Cursor,
        delivery: Option<&DeliveryTx>,
        cancel: Option<&CancellationToken>,
    ) -> WatchResult<ChangeEvent, F::Error> {
        match delivery {
            None => self.watch_once(&target, start_cursor, cancel).await,
            Some(delivery) => Err(self
                .watch_continuous(&target, start_cursor, delivery, cancel)
                .await
                .error),
        }
    }

    /// Wait for exactly one change, an error, or cancellation.
    pub async fn watch_once(
        &self,
        target: &WatchTarget,
        cursor: Cursor,
        cancel: Option<&CancellationToken>,
    ) -> WatchResult<ChangeEvent, F::Error> {
        let id = self.shared.next_id();

        self.shared.record(Diagnostic::Started {
            id,
            target,
            cursor,
            mode: Mode::Once,
        });

        task::watch_once(&self.shared, id, target, cursor, cancel).await
    }

    /// Send every change into `delivery` until an error or cancellation.
    pub async fn watch_continuous(
        &self,
        target: &WatchTarget,
        start_cursor: Cursor,
        delivery: &DeliveryTx,
        cancel: Option<&CancellationToken>,
    ) -> Stopped<F::Error> {
        let id = self.shared.next_id();

        self.shared.record(Diagnostic::Started {
            id,
            target,
            cursor: start_cursor,
            mode: Mode::Continuous,
        });

        WatchLoop::new(&self.shared, id, target, delivery, cancel)
            .run(start_cursor)
            .await
    }

    /// Run a continuous watch in the background and expose it as a stream.
    pub fn stream(&self, target: WatchTarget, start_cursor: Cursor) -> ChangeStream<F::Error> {
        let (tx, events) = mpsc::channel(self.shared.buffer);
        let (stopped_tx, stopped) = oneshot::channel();
        let cancel = CancellationToken::new();

        let watcher = self.clone();
        let loop_cancel = cancel.clone();

        self.shared.runtime.spawn(async move {
            let stopped = watcher
                .watch_continuous(&target, start_cursor, &tx, Some(&loop_cancel))
                .await;

            drop(tx);
            let _ = stopped_tx.send(stopped);
        });

        ChangeStream {
            events,
            stopped: Some(stopped),
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}
