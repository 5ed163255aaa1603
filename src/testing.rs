//! In-memory store transport for unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use displaydoc::Display;
use thiserror::Error;

use crate::{
    diagnostics::NullSink, events::ChangeEvent, fetch::FetchOptions, Action, Fetch, Watcher,
};

#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// the requested index {0} has been cleared
    IndexCleared(u64),
    /// connection reset by peer
    ConnectionReset,
}

/// What the next call to [`ScriptedFetch::fetch`] does.
#[derive(Debug)]
pub enum Reply {
    Event(ChangeEvent),
    Error(StoreError),
    After(Duration, Box<Reply>),
    /// Long poll which never returns
    Pending,
    Panic,
}

impl Reply {
    pub fn set(key: &str, modified_index: u64) -> Self {
        Reply::Event(ChangeEvent::new(Action::Set, key, modified_index))
    }

    pub fn after(self, delay: Duration) -> Self {
        Reply::After(delay, Box::new(self))
    }
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(count: &Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self(count.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Plays back a fixed list of replies, then blocks forever.
pub struct ScriptedFetch {
    requests: Mutex<Vec<(String, FetchOptions)>>,
    replies: Mutex<VecDeque<Reply>>,
    issued: tokio::sync::watch::Sender<usize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl ScriptedFetch {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(replies.into_iter().collect()),
            issued: tokio::sync::watch::channel(0).0,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<(String, FetchOptions)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn wait_indices(&self) -> Vec<Option<u64>> {
        self.requests()
            .into_iter()
            .map(|(_, options)| options.wait_index)
            .collect()
    }

    /// Fetches which have started and not yet finished or been dropped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Most fetches that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Resolves once at least `count` fetches have been issued.
    pub async fn issued(&self, count: usize) {
        let mut rx = self.issued.subscribe();
        rx.wait_for(|issued| *issued >= count).await.unwrap();
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    type Error = StoreError;

    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<ChangeEvent, StoreError> {
        let _in_flight = InFlight::enter(&self.in_flight);
        self.peak_in_flight
            .fetch_max(self.in_flight(), Ordering::SeqCst);

        self.requests.lock().unwrap().push((key.to_owned(), options));
        let reply = self.replies.lock().unwrap().pop_front();
        self.issued.send_modify(|issued| *issued += 1);

        let mut reply = reply.unwrap_or(Reply::Pending);
        loop {
            reply = match reply {
                Reply::Event(event) => return Ok(event),
                Reply::Error(error) => return Err(error),
                Reply::After(delay, next) => {
                    tokio::time::sleep(delay).await;
                    *next
                }
                Reply::Pending => std::future::pending().await,
                Reply::Panic => panic!("transport blew up"),
            }
        }
    }
}

pub fn watcher(fetch: &Arc<ScriptedFetch>) -> Watcher<Arc<ScriptedFetch>> {
    Watcher::builder(fetch.clone())
        .with_sink(NullSink)
        .build()
        .unwrap()
}
