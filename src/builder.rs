use std::sync::Arc;

use crate::{
    diagnostics::{DiagnosticSink, TracingSink},
    errors::InitError,
    fetch::Fetch,
    shared::SharedState,
    watcher::Watcher,
};

pub struct WatcherBuilder<F> {
    fetcher: F,
    buffer: usize,
    handle: Option<tokio::runtime::Handle>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    abort_on_cancel: bool,
}

impl<F: Fetch> WatcherBuilder<F> {
    pub fn new(fetcher: F) -> WatcherBuilder<F> {
        WatcherBuilder {
            fetcher,
            buffer: SharedState::<F>::DEFAULT_CAPACITY,
            handle: None,
            sink: None,
            abort_on_cancel: false,
        }
    }

    /// Runtime the fetch tasks are spawned on. Defaults to the runtime
    /// [`build`][`Self::build`] is called from.
    pub fn with_runtime(self, handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Some(handle),
            ..self
        }
    }

    /// Channel capacity used by [`Watcher::stream`].
    pub fn with_buffer(self, buffer: usize) -> Self {
        Self { buffer, ..self }
    }

    /// Where diagnostics go. Defaults to [`TracingSink`].
    pub fn with_sink(self, sink: impl DiagnosticSink) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
            ..self
        }
    }

    /// Abort the fetch task when a watch is cancelled, instead of leaving it to
    /// finish on its own.
    pub fn abort_on_cancel(self, abort_on_cancel: bool) -> Self {
        Self {
            abort_on_cancel,
            ..self
        }
    }

    pub fn build(self) -> Result<Watcher<F>, InitError> {
        if self.buffer == 0 {
            return Err(InitError::ZeroBuffer);
        }

        let runtime = match self.handle {
            Some(handle) => handle,
            None => tokio::runtime::Handle::try_current()?,
        };

        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));

        let shared = SharedState::new(
            self.fetcher,
            sink,
            runtime,
            self.buffer,
            self.abort_on_cancel,
        );

        Ok(Watcher { shared })
    }
}
