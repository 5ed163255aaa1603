use displaydoc::Display;
use thiserror::Error;

pub type WatchResult<T, E> = core::result::Result<T, WatchError<E>>;

/// Why a watch call, or a stream of watches, ended without an event.
///
/// `E` is the error type of the [`Fetch`][`crate::Fetch`] implementation, which is
/// passed through untouched in [`WatchError::Transport`].
#[derive(Debug, Error)]
pub enum WatchError<E> {
    /// The caller's cancellation signal fired before the fetch resolved.
    #[error("watch stopped by the user via the cancellation signal")]
    Cancelled,

    /// The fetch operation failed. Display and source are those of `E`.
    #[error(transparent)]
    Transport(E),

    /// The fetch task went away without reporting either an event or an error,
    /// for instance because the transport panicked or the runtime shut down.
    #[error("fetch task ended without producing a result")]
    FetchAborted,

    /// The receiving half of the delivery channel was dropped.
    #[error("delivery channel was closed by its receiver")]
    DeliveryClosed,
}

impl<E> WatchError<E> {
    /// Whether this watch ended because the caller asked it to.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WatchError::Cancelled)
    }

    /// The underlying fetch error, if this is one.
    pub fn transport(&self) -> Option<&E> {
        match self {
            WatchError::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Take the underlying fetch error out, if this is one.
    pub fn into_transport(self) -> Option<E> {
        match self {
            WatchError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure to build a [`Watcher`][`crate::Watcher`]
#[derive(Debug, Error, Display)]
pub enum InitError {
    /// No runtime handle was given and the builder was not called from within a tokio runtime
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// Stream buffer must be able to hold at least one event
    ZeroBuffer,
}
