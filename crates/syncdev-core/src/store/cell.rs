// ── Primitive state cell ──
//
// One cell per concern. The current value lives in a `watch` channel so
// async consumers can stream it; synchronous subscribers are held in a
// lock-free list and notified in `set` order before `set` returns.
// One thread delivers a round at a time; writers on other threads wait for
// it to finish, so a returning `set` has always reached every subscriber.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::trace;

use crate::stream::CellStream;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Read side shared by cells, read-only handles and derived values.
pub trait Observable<T: Send + Sync + 'static> {
    /// Name of the underlying cell, used in logs and the dependency graph.
    fn name(&self) -> &'static str;

    /// Current value. Never blocks on subscribers.
    fn get(&self) -> Arc<T>;

    /// Call `callback` with the current value now, then after every change.
    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static;

    /// Latest-value stream for async consumers. Intermediate values may be
    /// coalesced; use [`subscribe`](Self::subscribe) to observe every change.
    fn watch(&self) -> CellStream<T>;
}

// ── Subscription ─────────────────────────────────────────────────

/// Handle returned by `subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    detach: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    fn new(active: Arc<AtomicBool>, detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            active,
            detach: Mutex::new(Some(Box::new(detach))),
        }
    }

    /// Stop receiving notifications. Takes effect immediately, even in the
    /// middle of a notification round; calling it again is a no-op.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::Release);
        let detach = lock(&self.detach).take();
        if let Some(detach) = detach {
            detach();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

// ── Cell internals ───────────────────────────────────────────────

struct Subscriber<T> {
    id: u64,
    /// Sequence number of the value this subscriber was primed with.
    /// Queued values at or below it are skipped.
    primed_at: u64,
    active: Arc<AtomicBool>,
    callback: Callback<T>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            primed_at: self.primed_at,
            active: Arc::clone(&self.active),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Write-side bookkeeping. Values are queued so that a `set` issued from
/// inside a subscriber is delivered after the current round, never nested.
struct Dispatch<T> {
    seq: u64,
    pending: VecDeque<(u64, Arc<T>)>,
    /// Thread currently delivering, if any.
    drainer: Option<ThreadId>,
}

struct CellInner<T> {
    name: &'static str,
    value: watch::Sender<Arc<T>>,
    subscribers: ArcSwap<Vec<Subscriber<T>>>,
    next_id: AtomicU64,
    dispatch: Mutex<Dispatch<T>>,
    /// Signalled whenever `drainer` goes back to `None`.
    idle: Condvar,
}

impl<T> CellInner<T> {
    /// Lock the dispatch state once no other thread is delivering.
    fn lock_for_write(&self) -> MutexGuard<'_, Dispatch<T>> {
        let me = thread::current().id();
        let mut dispatch = lock(&self.dispatch);
        while dispatch.drainer.is_some_and(|t| t != me) {
            dispatch = self
                .idle
                .wait(dispatch)
                .unwrap_or_else(PoisonError::into_inner);
        }
        dispatch
    }

    fn finish_round(&self, dispatch: &mut Dispatch<T>) {
        dispatch.drainer = None;
        self.idle.notify_all();
    }

    fn remove_subscriber(&self, id: u64) {
        self.subscribers.rcu(|subs| {
            subs.iter()
                .filter(|s| s.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
    }
}

/// Resets the dispatch state if a subscriber panics mid-round, so later
/// writes are still delivered.
struct DrainGuard<'a, T>(&'a CellInner<T>);

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut dispatch = lock(&self.0.dispatch);
            dispatch.pending.clear();
            self.0.finish_round(&mut dispatch);
        }
    }
}

fn lock<G>(mutex: &Mutex<G>) -> MutexGuard<'_, G> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Cell ─────────────────────────────────────────────────────────

/// A mutable container for one concern's value.
///
/// Cloning a `Cell` clones the handle, not the value: all clones share the
/// same state and subscribers. Every write replaces the whole value.
pub struct Cell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Cell<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        let (value, _) = watch::channel(Arc::new(initial));
        Self {
            inner: Arc::new(CellInner {
                name,
                value,
                subscribers: ArcSwap::from_pointee(Vec::new()),
                next_id: AtomicU64::new(0),
                dispatch: Mutex::new(Dispatch {
                    seq: 0,
                    pending: VecDeque::new(),
                    drainer: None,
                }),
                idle: Condvar::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn get(&self) -> Arc<T> {
        self.inner.value.borrow().clone()
    }

    /// Replace the value and notify every subscriber before returning.
    ///
    /// Called from inside one of this cell's subscribers, the new value is
    /// delivered once the current round completes instead. Called from
    /// another thread while a round is running, it waits for that round.
    pub fn set(&self, value: T) {
        self.publish(|_| Some(value));
    }

    /// Replace the value with one computed from the current value.
    ///
    /// `next` runs while the cell's write lock is held and must not touch
    /// this cell.
    pub fn replace_with(&self, next: impl FnOnce(&T) -> T) {
        self.publish(|current| Some(next(current)));
    }

    /// Replace the value only if it differs from the current one.
    /// Returns whether subscribers were notified.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        self.publish(|current| (*current != value).then_some(value))
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let active = Arc::new(AtomicBool::new(true));
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        // Priming counts as a round: writes from other threads wait for it
        // so the first value this subscriber sees is the current one.
        let (current, owns_round) = {
            let mut dispatch = self.inner.lock_for_write();
            let subscriber = Subscriber {
                id,
                primed_at: dispatch.seq,
                active: Arc::clone(&active),
                callback: Arc::clone(&callback),
            };
            self.inner.subscribers.rcu(|subs| {
                let mut next = Vec::clone(subs);
                next.push(subscriber.clone());
                next
            });
            let owns_round = dispatch.drainer.is_none();
            if owns_round {
                dispatch.drainer = Some(thread::current().id());
            }
            (self.inner.value.borrow().clone(), owns_round)
        };
        trace!(cell = self.inner.name, id, "subscribed");

        if owns_round {
            let _guard = DrainGuard(&self.inner);
            callback(&current);
            // Deliver anything the priming callback wrote.
            self.drain();
        } else {
            callback(&current);
        }

        let weak: Weak<CellInner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(active, move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove_subscriber(id);
            }
        })
    }

    pub fn watch(&self) -> CellStream<T> {
        CellStream::new(self.inner.value.subscribe())
    }

    /// A handle that can read and subscribe but not write.
    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly(self.clone())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.load().len()
    }

    fn publish(&self, next: impl FnOnce(&T) -> Option<T>) -> bool {
        let mut dispatch = self.inner.lock_for_write();
        let current = self.inner.value.borrow().clone();
        let Some(value) = next(&current) else {
            return false;
        };

        let value = Arc::new(value);
        self.inner.value.send_replace(Arc::clone(&value));
        dispatch.seq += 1;
        let seq = dispatch.seq;
        dispatch.pending.push_back((seq, value));
        trace!(cell = self.inner.name, seq, "cell updated");

        if dispatch.drainer.is_some() {
            // Re-entrant write: the outer round on this thread delivers it
            // once the current value has reached every subscriber.
            return true;
        }
        dispatch.drainer = Some(thread::current().id());
        drop(dispatch);

        self.drain();
        true
    }

    fn drain(&self) {
        let _guard = DrainGuard(&self.inner);
        loop {
            let (seq, value) = {
                let mut dispatch = lock(&self.inner.dispatch);
                let Some(entry) = dispatch.pending.pop_front() else {
                    self.inner.finish_round(&mut dispatch);
                    return;
                };
                entry
            };

            let subscribers = self.inner.subscribers.load_full();
            for sub in subscribers.iter() {
                if sub.primed_at < seq && sub.active.load(Ordering::Acquire) {
                    (sub.callback)(&value);
                }
            }
        }
    }
}

impl<T: Send + Sync + 'static> Observable<T> for Cell<T> {
    fn name(&self) -> &'static str {
        Cell::name(self)
    }

    fn get(&self) -> Arc<T> {
        Cell::get(self)
    }

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Cell::subscribe(self, callback)
    }

    fn watch(&self) -> CellStream<T> {
        Cell::watch(self)
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ── ReadOnly ─────────────────────────────────────────────────────

/// Read-only view of a cell, handed to consumers that must not write.
pub struct ReadOnly<T>(Cell<T>);

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Send + Sync + 'static> ReadOnly<T> {
    pub fn get(&self) -> Arc<T> {
        self.0.get()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.subscribe(callback)
    }

    pub fn watch(&self) -> CellStream<T> {
        self.0.watch()
    }

    /// Whether two handles point at the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.inner, &other.0.inner)
    }
}

impl<T: Send + Sync + 'static> Observable<T> for ReadOnly<T> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn get(&self) -> Arc<T> {
        self.0.get()
    }

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.0.subscribe(callback)
    }

    fn watch(&self) -> CellStream<T> {
        self.0.watch()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.0).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Collects every value a subscriber sees.
    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync)
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn subscribe_primes_with_current_value() {
        let cell = Cell::new("n", 1);
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn set_notifies_before_returning_in_order() {
        let cell = Cell::new("n", 0);
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);
        cell.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
        cell.set(2);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(*cell.get(), 2);
    }

    #[test]
    fn every_subscriber_sees_the_same_order() {
        let cell = Cell::new("n", 0);
        let (a, fa) = recorder();
        let (b, fb) = recorder();
        let _sa = cell.subscribe(fa);
        let _sb = cell.subscribe(fb);
        cell.set(1);
        cell.set(2);
        assert_eq!(*a.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(*b.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn set_always_notifies_even_when_equal() {
        let cell = Cell::new("n", 5);
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);
        cell.set(5);
        assert_eq!(*seen.lock().unwrap(), vec![5, 5]);
    }

    #[test]
    fn set_if_changed_skips_equal_values() {
        let cell = Cell::new("n", 5);
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);
        assert!(!cell.set_if_changed(5));
        assert!(cell.set_if_changed(6));
        assert_eq!(*seen.lock().unwrap(), vec![5, 6]);
    }

    #[test]
    fn replace_with_sees_current_value() {
        let cell = Cell::new("n", vec![1]);
        cell.replace_with(|v| {
            let mut next = v.clone();
            next.push(2);
            next
        });
        assert_eq!(*cell.get(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stops_delivery() {
        let cell = Cell::new("n", 0);
        let (seen, f) = recorder();
        let sub = cell.subscribe(f);
        assert_eq!(cell.subscriber_count(), 1);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(cell.subscriber_count(), 0);

        cell.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let cell = Cell::new("n", 0);
        let (seen, f) = recorder();
        drop(cell.subscribe(f));
        cell.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn reentrant_set_is_delivered_after_current_round() {
        let cell = Cell::new("n", 0);
        let writer = cell.clone();
        let _echo = cell.subscribe(move |v: &i32| {
            if *v == 1 {
                writer.set(2);
            }
        });
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);

        cell.set(1);
        // The second subscriber saw 1 before 2 even though 2 was written
        // while 1 was still being delivered.
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(*cell.get(), 2);
    }

    #[test]
    fn late_subscriber_never_sees_older_values() {
        let cell = Cell::new("n", 0);
        let late: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (seen, f) = recorder();
        let f = Arc::new(f);

        let handle = cell.clone();
        let slot = Arc::clone(&late);
        let _spawner = cell.subscribe(move |v: &i32| {
            if *v == 1 {
                handle.set(2);
                let f = Arc::clone(&f);
                let sub = handle.subscribe(move |v: &i32| f(v));
                *slot.lock().unwrap() = Some(sub);
            }
        });

        cell.set(1);
        // Primed with 2 (the latest value), then nothing older.
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn unsubscribe_during_round_takes_effect_immediately() {
        let cell = Cell::new("n", 0);
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&victim);
        let _killer = cell.subscribe(move |v: &i32| {
            if *v != 1 {
                return;
            }
            if let Some(sub) = slot.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        let (seen, f) = recorder();
        *victim.lock().unwrap() = Some(cell.subscribe(f));

        cell.set(1);
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[test]
    fn writer_on_another_thread_waits_for_the_running_round() {
        use std::sync::mpsc;
        use std::time::Duration;

        use crate::store::Derived;

        let cell = Cell::new("n", 0);
        let doubled = Derived::new("doubled", &cell, |n: &i32| n * 2);

        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let _slow = cell.subscribe(move |v: &i32| {
            if *v == 1 {
                entered_tx.send(()).unwrap();
                let _ = release_rx.lock().unwrap().recv_timeout(Duration::from_secs(5));
            }
        });
        let (seen, f) = recorder();
        let _sub = cell.subscribe(f);

        let writer = cell.clone();
        let first = thread::spawn(move || writer.set(1));
        entered_rx.recv().unwrap();
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let _ = release_tx.send(());
        });

        // Blocks until the round delivering 1 has finished, then delivers 2.
        cell.set(2);
        assert_eq!(*doubled.get(), 4);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);

        first.join().unwrap();
        releaser.join().unwrap();
    }

    #[test]
    fn read_only_shares_the_cell() {
        let cell = Cell::new("n", 1);
        let view = cell.read_only();
        cell.set(3);
        assert_eq!(*view.get(), 3);
        assert!(view.same_cell(&cell.read_only()));
        assert_eq!(Observable::name(&view), "n");
    }
}
