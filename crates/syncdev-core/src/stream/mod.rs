// ── Async access to cells ──
//
// Synchronous subscribers see every value in order. Async code usually only
// cares about "what is it now" and "tell me when it moves", so these readers
// sit on the cell's `watch` channel and skip values they were too slow for.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

pub use filter::{EventFilter, PeerFilter};

/// Async reader for one cell, obtained from `watch()`.
///
/// Tracks which value it last handed out, so [`next_value`](Self::next_value)
/// only resolves for something newer.
pub struct CellStream<T: Send + Sync + 'static> {
    receiver: watch::Receiver<Arc<T>>,
}

impl<T: Send + Sync + 'static> CellStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<T>>) -> Self {
        Self { receiver }
    }

    /// The cell's value right now. Does not count as taking it.
    pub fn peek(&self) -> Arc<T> {
        Arc::clone(&self.receiver.borrow())
    }

    /// Whether the cell was written since the last value was taken.
    /// `false` once the cell is gone.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for a write newer than the last value taken and take it. Several
    /// writes in between collapse into the latest one.
    ///
    /// `None` once every handle to the cell has been dropped.
    pub async fn next_value(&mut self) -> Option<Arc<T>> {
        self.receiver.changed().await.ok()?;
        Some(Arc::clone(&self.receiver.borrow_and_update()))
    }

    /// Wait until the value satisfies `pred`, checking the current value
    /// first.
    pub async fn wait_for(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<Arc<T>> {
        let value = self.receiver.wait_for(|v| pred(v.as_ref())).await.ok()?;
        Some(Arc::clone(&value))
    }

    /// Every value from now on as a `Stream`, starting with the current one.
    pub fn into_stream(self) -> CellWatchStream<T> {
        CellWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` form of a [`CellStream`].
pub struct CellWatchStream<T: Send + Sync + 'static> {
    inner: WatchStream<Arc<T>>,
}

impl<T: Send + Sync + 'static> Stream for CellWatchStream<T> {
    type Item = Arc<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use futures_util::StreamExt;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use crate::model::progress::tests::snapshot;
    use crate::model::{Progress, ProgressStatus};
    use crate::store::{Cell, Observable, StateStore};

    #[test]
    fn next_value_is_pending_until_a_write() {
        let cell = Cell::new("n", 1);
        let mut reader = cell.watch();
        assert!(!reader.has_changed());

        let mut next = task::spawn(reader.next_value());
        assert_pending!(next.poll());
        cell.set(2);
        assert!(next.is_woken());
        assert_ready_eq!(next.poll(), Some(Arc::new(2)));
    }

    #[tokio::test]
    async fn slow_reader_gets_only_the_latest_write() {
        let cell = Cell::new("tab", "peers");
        let mut reader = cell.watch();
        cell.set("folders");
        cell.set("activity");

        assert!(reader.has_changed());
        assert_eq!(*reader.next_value().await.unwrap(), "activity");
        assert!(!reader.has_changed());
        assert_eq!(*reader.peek(), "activity");
    }

    #[tokio::test]
    async fn reader_ends_with_its_cell() {
        let cell = Cell::new("n", 0_u8);
        let mut reader = cell.watch();
        drop(cell);
        assert!(reader.next_value().await.is_none());
        assert!(!reader.has_changed());
    }

    #[tokio::test]
    async fn wait_for_sync_to_finish() {
        let store = Arc::new(StateStore::default());
        store.progress.set(Progress::Reported(snapshot(ProgressStatus::Syncing)));
        let mut syncing = store.derived().is_syncing.watch();

        let writer = Arc::clone(&store);
        let done = tokio::spawn(async move {
            writer.progress.set(Progress::Absent);
        });

        let finished = syncing.wait_for(|busy| !busy).await.unwrap();
        assert!(!*finished);
        done.await.unwrap();
    }

    #[tokio::test]
    async fn stream_starts_from_the_current_value() {
        let cell = Cell::new("status", "idle".to_owned());
        let mut values = cell.watch().into_stream();
        assert_eq!(values.next().await.unwrap().as_str(), "idle");

        cell.set("syncing".to_owned());
        assert_eq!(values.next().await.unwrap().as_str(), "syncing");
    }
}
