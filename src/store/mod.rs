//! Client-side store for state the query cache does not own.
//!
//! Readers see immutable snapshots. Writers build a new snapshot from the
//! previous one, so no subscriber can observe a half-applied update.

mod portal;

pub use portal::{PortalState, PortalStore};

use std::sync::Arc;

use tokio::sync::watch;

/// Snapshot container with projection subscriptions.
pub struct Store<S> {
    tx: watch::Sender<Arc<S>>,
}

impl<S> Store<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.tx.borrow())
    }

    /// Replace the state with `f(current)`. Subscribers are woken only when
    /// the new state differs from the old one.
    pub fn update(&self, f: impl FnOnce(&S) -> S) -> bool {
        self.tx.send_if_modified(|current| {
            let next = f(current);
            if next == **current {
                return false;
            }
            *current = Arc::new(next);
            true
        })
    }

    /// Subscribe to a projection of the state.
    pub fn select<T, P>(&self, projection: P) -> Selector<S, T, P>
    where
        P: Fn(&S) -> T,
        T: Clone + PartialEq,
    {
        let mut rx = self.tx.subscribe();
        let current = Arc::clone(&rx.borrow_and_update());
        let last = projection(&current);
        Selector {
            rx,
            projection,
            last,
        }
    }
}

/// A subscription to one projection of a [`Store`].
pub struct Selector<S, T, P> {
    rx: watch::Receiver<Arc<S>>,
    projection: P,
    last: T,
}

impl<S, T, P> Selector<S, T, P>
where
    P: Fn(&S) -> T,
    T: Clone + PartialEq,
{
    /// The last value seen by this selector.
    pub fn get(&self) -> &T {
        &self.last
    }

    /// Wait until the projected value differs from the last one seen.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<T> {
        loop {
            self.rx.changed().await.ok()?;
            let snapshot = Arc::clone(&self.rx.borrow_and_update());
            let next = (self.projection)(&snapshot);
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}
