use std::future::Future;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{
    bridge::{FetchRx, FetchTx},
    diagnostics::Diagnostic,
    errors::{WatchError, WatchResult},
    events::{ChangeEvent, Cursor, WatchTarget},
    fetch::{Fetch, FetchOptions},
    shared::{Shared, WatchId},
};

cfg_if::cfg_if! {
    if #[cfg(feature = "tracing")] {
        fn instrumented<Fut: Future>(fut: Fut, id: WatchId, key: &str) -> impl Future<Output = Fut::Output> {
            use tracing_impl::Instrument;

            fut.instrument(tracing_impl::debug_span!("watch_fetch", watch = %id, key))
        }
    } else {
        fn instrumented<Fut: Future>(fut: Fut, _: WatchId, _: &str) -> Fut {
            fut
        }
    }
}

/// A single long-poll fetch, run on its own task.
pub(crate) struct FetchTask<F> {
    shared: Shared<F>,
    id: WatchId,
    key: String,
    options: FetchOptions,
}

impl<F: Fetch> FetchTask<F> {
    pub fn new(shared: &Shared<F>, id: WatchId, target: &WatchTarget, cursor: Cursor) -> Self {
        Self {
            shared: shared.clone(),
            id,
            key: target.key.clone(),
            options: FetchOptions::watch(target, cursor),
        }
    }

    /// Spawn the fetch. Its outcome is written once to the returned receiver.
    ///
    /// If the receiver has been dropped by then the outcome is discarded, and
    /// the task ends as soon as the fetch itself resolves.
    pub fn launch(self) -> (tokio::task::JoinHandle<()>, FetchRx<F::Error>) {
        let (tx, rx) = oneshot::channel();

        let runtime = self.shared.runtime.clone();
        let (id, key) = (self.id, self.key.clone());

        let jh = runtime.spawn(instrumented(self.run(tx), id, &key));

        (jh, rx)
    }

    async fn run(self, tx: FetchTx<F::Error>) {
        let Self {
            shared, key, options, ..
        } = self;

        let outcome = shared.fetcher.fetch(&key, options).await;

        let _ = tx.send(outcome);
    }
}

/// Wait for exactly one change on `target`, racing the fetch against `cancel`.
///
/// Cancellation is observed first when both are ready. A fetch which loses the
/// race is left to finish on its own unless the watcher was built with
/// `abort_on_cancel`.
pub(crate) async fn watch_once<F: Fetch>(
    shared: &Shared<F>,
    id: WatchId,
    target: &WatchTarget,
    cursor: Cursor,
    cancel: Option<&CancellationToken>,
) -> WatchResult<ChangeEvent, F::Error> {
    let task = FetchTask::new(shared, id, target, cursor);

    shared.record(Diagnostic::FetchIssued {
        id,
        target,
        options: task.options,
    });

    let (jh, rx) = task.launch();

    let outcome = match cancel {
        Some(cancel) => tokio::select! {
            biased;

            _ = cancel.cancelled() => None,
            outcome = rx => Some(outcome),
        },
        None => Some(rx.await),
    };

    match outcome {
        None => {
            if shared.abort_on_cancel {
                jh.abort();
            }

            shared.record(Diagnostic::Cancelled { id, target });
            Err(WatchError::Cancelled)
        }
        Some(Ok(Ok(event))) => Ok(event),
        Some(Ok(Err(e))) => {
            shared.record(Diagnostic::FetchFailed {
                id,
                target,
                error: &e,
            });
            Err(WatchError::Transport(e))
        }
        Some(Err(_)) => {
            shared.record(Diagnostic::FetchAborted { id, target });
            Err(WatchError::FetchAborted)
        }
    }
}
