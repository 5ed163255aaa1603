use tokio_util::sync::CancellationToken;

use crate::{
    bridge::DeliveryTx,
    diagnostics::Diagnostic,
    errors::WatchError,
    events::{Cursor, WatchTarget},
    fetch::Fetch,
    shared::{Shared, WatchId},
    task::watch_once,
};

/// How a continuous watch ended.
#[derive(Debug)]
pub struct Stopped<E> {
    /// The error which moved the watch out of its polling state.
    pub error: WatchError<E>,
    /// Cursor the next watch would have been issued with.
    pub cursor: Cursor,
    /// Number of events written to the delivery channel.
    pub delivered: u64,
}

enum LoopState<E> {
    Polling { cursor: Cursor },
    Stopped(Stopped<E>),
}

/// Repeated one-shot watches, feeding each delivered change's version into the next.
pub(crate) struct WatchLoop<'a, F> {
    shared: &'a Shared<F>,
    id: WatchId,
    target: &'a WatchTarget,
    delivery: &'a DeliveryTx,
    cancel: Option<&'a CancellationToken>,
    delivered: u64,
}

impl<'a, F: Fetch> WatchLoop<'a, F> {
    pub fn new(
        shared: &'a Shared<F>,
        id: WatchId,
        target: &'a WatchTarget,
        delivery: &'a DeliveryTx,
        cancel: Option<&'a CancellationToken>,
    ) -> Self {
        Self {
            shared,
            id,
            target,
            delivery,
            cancel,
            delivered: 0,
        }
    }

    /// Watch once from `cursor` and hand the change to the delivery channel.
    ///
    /// Returns the cursor for the next watch. Sending waits for room in the
    /// channel without looking at the cancellation signal.
    async fn step(&mut self, cursor: Cursor) -> Result<Cursor, WatchError<F::Error>> {
        let event = watch_once(self.shared, self.id, self.target, cursor, self.cancel).await?;

        let modified_index = event.modified_index;
        let key = event.key.clone();

        if self.delivery.send(event).await.is_err() {
            self.shared.record(Diagnostic::DeliveryClosed {
                id: self.id,
                target: self.target,
            });
            return Err(WatchError::DeliveryClosed);
        }

        self.delivered += 1;
        self.shared.record(Diagnostic::Delivered {
            id: self.id,
            key: &key,
            modified_index,
        });

        Ok(modified_index.max(cursor))
    }

    /// Poll until the first error. Only a delivered change ever moves the cursor.
    pub async fn run(mut self, start: Cursor) -> Stopped<F::Error> {
        let mut state = LoopState::Polling { cursor: start };

        loop {
            state = match state {
                LoopState::Polling { cursor } => match self.step(cursor).await {
                    Ok(next) => LoopState::Polling { cursor: next },
                    Err(error) => LoopState::Stopped(Stopped {
                        error,
                        cursor,
                        delivered: self.delivered,
                    }),
                },
                LoopState::Stopped(stopped) => {
                    self.shared.record(Diagnostic::Stopped {
                        id: self.id,
                        target: self.target,
                        cursor: stopped.cursor,
                        delivered: stopped.delivered,
                    });

                    return stopped;
                }
            }
        }
    }
}
