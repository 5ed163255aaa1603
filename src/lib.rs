#![doc = include_str!("docs/lib.md")]

/// Errors produced by this crate
pub mod errors;

/// Structured diagnostics and the sinks which receive them
pub mod diagnostics;

// To Re-Export
mod builder;
mod driver;
mod events;
mod fetch;
mod futures;
mod watcher;

pub use builder::*;
pub use driver::Stopped;
pub use events::*;
pub use fetch::*;
pub use futures::*;
pub use watcher::*;

pub use bridge::{DeliveryRx, DeliveryTx};
pub use diagnostics::{DiagnosticSink, NullSink, TracingSink};
pub use errors::{InitError, WatchError, WatchResult};
pub use shared::WatchId;

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

// Internals

/// Channel types used between the fetch task, the watch loop and callers.
mod bridge;

/// State which is shared between a watcher, its clones, and its fetch tasks.
mod shared;

/// Fetch task and the one-shot race against cancellation.
mod task;

#[cfg(test)]
mod testing;
