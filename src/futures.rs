use std::{
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
};

use tokio::sync::oneshot::Receiver as OnceRecv;
use tokio_stream::Stream;
use tokio_util::sync::DropGuard;

use crate::{
    bridge::DeliveryRx,
    driver::Stopped,
    errors::{WatchError, WatchResult},
    events::ChangeEvent,
};

/// Continuous watch exposed as a [`Stream`].
///
/// Yields every change in order, then the error that ended the watch, then
/// `None`. Dropping the stream cancels the watch running behind it.
#[derive(Debug)]
pub struct ChangeStream<E> {
    pub(crate) events: DeliveryRx,
    pub(crate) stopped: Option<OnceRecv<Stopped<E>>>,
    pub(crate) _cancel_on_drop: DropGuard,
}

impl<E> Stream for ChangeStream<E> {
    type Item = WatchResult<ChangeEvent, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(event) = ready!(self.events.poll_recv(cx)) {
            return Poll::Ready(Some(Ok(event)));
        }

        let Some(stopped) = &mut self.stopped else {
            return Poll::Ready(None);
        };

        let outcome = ready!(Pin::new(stopped).poll(cx));
        self.stopped = None;

        Poll::Ready(Some(Err(match outcome {
            Ok(stopped) => stopped.error,
            Err(_) => WatchError::FetchAborted,
        })))
    }
}
