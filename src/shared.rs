use std::{
    fmt::{Display, Formatter},
    sync::{atomic::AtomicUsize, Arc},
};

use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Unique id of a single watch call, used to correlate diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WatchId(usize);

impl Display for WatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

pub(crate) struct SharedState<F> {
    next_id: AtomicUsize,
    pub fetcher: F,
    pub sink: Arc<dyn DiagnosticSink>,
    pub runtime: tokio::runtime::Handle,
    pub buffer: usize,
    pub abort_on_cancel: bool,
}

impl<F> SharedState<F> {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new(
        fetcher: F,
        sink: Arc<dyn DiagnosticSink>,
        runtime: tokio::runtime::Handle,
        buffer: usize,
        abort_on_cancel: bool,
    ) -> Arc<Self> {
        Arc::new(Self {
            next_id: 0.into(),
            fetcher,
            sink,
            runtime,
            buffer,
            abort_on_cancel,
        })
    }

    pub fn next_id(&self) -> WatchId {
        use std::sync::atomic::Ordering;

        WatchId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn record(&self, diagnostic: Diagnostic<'_>) {
        self.sink.record(&diagnostic);
    }
}

impl<F> std::fmt::Debug for SharedState<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("next_id", &self.next_id)
            .field("buffer", &self.buffer)
            .field("abort_on_cancel", &self.abort_on_cancel)
            .finish_non_exhaustive()
    }
}

pub(crate) type Shared<F> = Arc<SharedState<F>>;
