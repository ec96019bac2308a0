// ── Derived values ──
//
// A derived value owns a private output cell and keeps it in step with its
// upstream cell(s) through ordinary subscriptions. Recomputation is eager
// and synchronous; the output only notifies when the result changes.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::cell::{Cell, Observable, Subscription};
use crate::stream::CellStream;

/// Read-only value computed from one or two upstream observables.
pub struct Derived<T> {
    output: Cell<T>,
    upstream: Arc<[&'static str]>,
    links: Arc<Vec<Subscription>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            output: self.output.clone(),
            upstream: Arc::clone(&self.upstream),
            links: Arc::clone(&self.links),
        }
    }
}

impl<T: PartialEq + Send + Sync + 'static> Derived<T> {
    /// Derive from a single upstream.
    pub fn new<S, O, F>(name: &'static str, source: &O, map: F) -> Self
    where
        S: Send + Sync + 'static,
        O: Observable<S>,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let output = Cell::new(name, map(&source.get()));
        let target = output.clone();
        let link = source.subscribe(move |value: &S| {
            if target.set_if_changed(map(value)) {
                trace!(derived = target.name(), "recomputed");
            }
        });
        Self {
            output,
            upstream: Arc::from([source.name()]),
            links: Arc::new(vec![link]),
        }
    }

    /// Derive from two upstreams. Either changing recomputes the value with
    /// the other's current value.
    pub fn combine<A, B, OA, OB, F>(name: &'static str, a: &OA, b: &OB, map: F) -> Self
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        OA: Observable<A> + Clone + Send + Sync + 'static,
        OB: Observable<B> + Clone + Send + Sync + 'static,
        F: Fn(&A, &B) -> T + Send + Sync + 'static,
    {
        let map = Arc::new(map);
        let output = Cell::new(name, map(&a.get(), &b.get()));

        let link_a = {
            let (target, other, map) = (output.clone(), b.clone(), Arc::clone(&map));
            a.subscribe(move |value: &A| {
                if target.set_if_changed(map(value, &other.get())) {
                    trace!(derived = target.name(), "recomputed");
                }
            })
        };
        let link_b = {
            let (target, other, map) = (output.clone(), a.clone(), Arc::clone(&map));
            b.subscribe(move |value: &B| {
                if target.set_if_changed(map(&other.get(), value)) {
                    trace!(derived = target.name(), "recomputed");
                }
            })
        };

        Self {
            output,
            upstream: Arc::from([a.name(), b.name()]),
            links: Arc::new(vec![link_a, link_b]),
        }
    }

    /// Names of the cells this value is computed from.
    pub fn upstream(&self) -> &[&'static str] {
        &self.upstream
    }
}

impl<T: Send + Sync + 'static> Observable<T> for Derived<T> {
    fn name(&self) -> &'static str {
        self.output.name()
    }

    fn get(&self) -> Arc<T> {
        self.output.get()
    }

    fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.output.subscribe(callback)
    }

    fn watch(&self) -> CellStream<T> {
        self.output.watch()
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("output", &self.output)
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}
