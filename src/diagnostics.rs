use std::sync::Arc;

use crate::{
    events::{Cursor, WatchTarget},
    fetch::FetchOptions,
    shared::WatchId,
};

/// Whether a watch call returns after one change or keeps streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Once,
    Continuous,
}

/// Structured record of something a [`Watcher`][`crate::Watcher`] did.
#[non_exhaustive]
#[derive(Debug, Clone, Copy)]
pub enum Diagnostic<'a> {
    Started {
        id: WatchId,
        target: &'a WatchTarget,
        cursor: Cursor,
        mode: Mode,
    },
    FetchIssued {
        id: WatchId,
        target: &'a WatchTarget,
        options: FetchOptions,
    },
    Delivered {
        id: WatchId,
        key: &'a str,
        modified_index: u64,
    },
    Cancelled {
        id: WatchId,
        target: &'a WatchTarget,
    },
    FetchFailed {
        id: WatchId,
        target: &'a WatchTarget,
        error: &'a (dyn std::error::Error + 'static),
    },
    FetchAborted {
        id: WatchId,
        target: &'a WatchTarget,
    },
    DeliveryClosed {
        id: WatchId,
        target: &'a WatchTarget,
    },
    /// A continuous watch left its polling state.
    Stopped {
        id: WatchId,
        target: &'a WatchTarget,
        cursor: Cursor,
        delivered: u64,
    },
}

impl Diagnostic<'_> {
    pub fn id(&self) -> WatchId {
        use Diagnostic::*;
        match *self {
            Started { id, .. }
            | FetchIssued { id, .. }
            | Delivered { id, .. }
            | Cancelled { id, .. }
            | FetchFailed { id, .. }
            | FetchAborted { id, .. }
            | DeliveryClosed { id, .. }
            | Stopped { id, .. } => id,
        }
    }

    /// Short stable name for this kind of record.
    pub fn kind(&self) -> &'static str {
        use Diagnostic::*;
        match self {
            Started { .. } => "started",
            FetchIssued { .. } => "fetch_issued",
            Delivered { .. } => "delivered",
            Cancelled { .. } => "cancelled",
            FetchFailed { .. } => "fetch_failed",
            FetchAborted { .. } => "fetch_aborted",
            DeliveryClosed { .. } => "delivery_closed",
            Stopped { .. } => "stopped",
        }
    }
}

/// Destination for [`Diagnostic`] records, injected when building a watcher.
pub trait DiagnosticSink: Send + Sync + 'static {
    fn record(&self, diagnostic: &Diagnostic<'_>);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn record(&self, diagnostic: &Diagnostic<'_>) {
        (**self).record(diagnostic)
    }
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _: &Diagnostic<'_>) {}
}

/// Forwards records to `tracing` when the `tracing` feature is enabled,
/// otherwise behaves like [`NullSink`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

cfg_if::cfg_if! {
    if #[cfg(feature = "tracing")] {
        impl DiagnosticSink for TracingSink {
            fn record(&self, diagnostic: &Diagnostic<'_>) {
                use tracing_impl::{debug, info, warn};
                use Diagnostic::*;

                match *diagnostic {
                    Started { id, target, cursor, mode } => {
                        debug!(watch = %id, %target, cursor, ?mode, "Starting watch")
                    }
                    FetchIssued { id, target, options } => debug!(
                        watch = %id,
                        %target,
                        wait_index = ?options.wait_index,
                        "Issuing fetch"
                    ),
                    Delivered { id, key, modified_index } => {
                        debug!(watch = %id, key, modified_index, "Delivered change")
                    }
                    Cancelled { id, target } => info!(watch = %id, %target, "Watch cancelled"),
                    FetchFailed { id, target, error } => {
                        warn!(watch = %id, %target, %error, "Fetch failed")
                    }
                    FetchAborted { id, target } => {
                        warn!(watch = %id, %target, "Fetch task ended without a result")
                    }
                    DeliveryClosed { id, target } => {
                        info!(watch = %id, %target, "Delivery receiver dropped")
                    }
                    Stopped { id, target, cursor, delivered } => {
                        debug!(watch = %id, %target, cursor, delivered, "Watch stopped")
                    }
                }
            }
        }
    } else {
        impl DiagnosticSink for TracingSink {
            fn record(&self, _: &Diagnostic<'_>) {}
        }
    }
}
