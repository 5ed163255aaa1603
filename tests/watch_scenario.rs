use anyhow::Context;
use kvwatch::{
    async_trait, Action, CancellationToken, ChangeEvent, Fetch, FetchOptions, WatchError,
    WatchTarget, Watcher,
};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;

#[derive(Debug, thiserror::Error, PartialEq)]
enum StoreError {
    #[error("the requested history has been cleared (index {0})")]
    EventIndexCleared(u64),
    #[error("store went away")]
    Gone,
}

type Reply = oneshot::Sender<Result<ChangeEvent, StoreError>>;

/// Store whose every long poll is answered by hand from the test.
struct ManualStore {
    requests: mpsc::UnboundedSender<(String, FetchOptions, Reply)>,
}

impl ManualStore {
    fn new() -> (Self, mpsc::UnboundedReceiver<(String, FetchOptions, Reply)>) {
        let (requests, rx) = mpsc::unbounded_channel();
        (Self { requests }, rx)
    }
}

#[async_trait]
impl Fetch for ManualStore {
    type Error = StoreError;

    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<ChangeEvent, StoreError> {
        let (reply, answer) = oneshot::channel();

        self.requests
            .send((key.to_owned(), options, reply))
            .map_err(|_| StoreError::Gone)?;

        answer.await.unwrap_or(Err(StoreError::Gone))
    }
}

#[tokio::test]
async fn delivers_then_resumes_from_modified_index_until_cancelled() -> anyhow::Result<()> {
    let (store, mut requests) = ManualStore::new();
    let watcher = Watcher::new(store)?;
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(8);

    let handle = {
        let watcher = watcher.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { watcher.watch("/a", 0, Some(&tx), Some(&cancel)).await })
    };

    let (key, options, reply) = requests.recv().await.context("first fetch")?;
    assert_eq!(key, "/a");
    assert_eq!(
        options,
        FetchOptions {
            wait: true,
            wait_index: None,
            recursive: None,
        }
    );
    let _ = reply.send(Ok(ChangeEvent::new(Action::Set, "/a", 6).with_value("on")));

    let delivered = rx.recv().await.context("first delivery")?;
    assert_eq!(delivered.key, "/a");
    assert_eq!(delivered.modified_index, 6);
    assert_eq!(delivered.value.as_deref(), Some("on"));

    let (_, options, late_reply) = requests.recv().await.context("second fetch")?;
    assert_eq!(options.wait_index, Some(6));

    cancel.cancel();
    let err = handle.await?.unwrap_err();
    assert!(err.is_cancelled());

    // The abandoned fetch answering afterwards changes nothing.
    let _ = late_reply.send(Ok(ChangeEvent::new(Action::Set, "/a", 7)));
    assert!(rx.recv().await.is_none());

    Ok(())
}

#[tokio::test]
async fn cleared_index_ends_the_prefix_watch() -> anyhow::Result<()> {
    let (store, mut requests) = ManualStore::new();
    let watcher = Watcher::new(store)?;
    let (tx, mut rx) = mpsc::channel(8);

    let handle = tokio::spawn(async move { watcher.watch_all("/jobs", 3, Some(&tx), None).await });

    let (key, options, reply) = requests.recv().await.context("first fetch")?;
    assert_eq!(key, "/jobs");
    assert_eq!(options.wait_index, Some(3));
    assert_eq!(options.recursive, Some(true));
    let _ = reply.send(Ok(
        ChangeEvent::new(Action::Create, "/jobs/17", 4).with_value("queued")
    ));

    let (_, options, reply) = requests.recv().await.context("second fetch")?;
    assert_eq!(options.wait_index, Some(4));
    let _ = reply.send(Err(StoreError::EventIndexCleared(4)));

    let err = handle.await?.unwrap_err();
    assert!(matches!(
        err,
        WatchError::Transport(StoreError::EventIndexCleared(4))
    ));

    assert_eq!(rx.recv().await.map(|e| e.key), Some("/jobs/17".to_owned()));
    assert!(rx.recv().await.is_none());
    assert!(requests.try_recv().is_err());

    Ok(())
}

#[tokio::test]
async fn stream_of_changes() -> anyhow::Result<()> {
    let (store, mut requests) = ManualStore::new();
    let watcher = Watcher::builder(store).with_buffer(1).build()?;

    let mut changes = watcher.stream(WatchTarget::key("/flag"), 0);

    for index in [10, 11] {
        let (_, _, reply) = requests.recv().await.context("fetch")?;
        let _ = reply.send(Ok(ChangeEvent::new(Action::Update, "/flag", index)));

        let change = changes.next().await.context("change")??;
        assert_eq!(change.modified_index, index);
    }

    let (_, options, reply) = requests.recv().await.context("third fetch")?;
    assert_eq!(options.wait_index, Some(11));
    let _ = reply.send(Err(StoreError::Gone));

    let err = changes.next().await.context("terminal error")?.unwrap_err();
    assert_eq!(err.into_transport(), Some(StoreError::Gone));
    assert!(changes.next().await.is_none());

    Ok(())
}
