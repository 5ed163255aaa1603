use crate::events::ChangeEvent;

use tokio::sync::{mpsc, oneshot};

/// Caller-owned conduit a continuous watch writes each change into.
pub type DeliveryTx = mpsc::Sender<ChangeEvent>;
pub type DeliveryRx = mpsc::Receiver<ChangeEvent>;

pub(crate) type FetchTx<E> = oneshot::Sender<Result<ChangeEvent, E>>;
pub(crate) type FetchRx<E> = oneshot::Receiver<Result<ChangeEvent, E>>;
