//! Keyed query cache.
//!
//! Entries are keyed by entity name plus an optional scope (usually a user
//! id). Concurrent readers of one key share a single in-flight request.
//! Every request carries an issue sequence number, and a result is stored
//! only if nothing issued later has been stored and the key was not
//! invalidated after the request was issued.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::errors::AppError;

type CacheValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CacheValue, AppError>>>;

/// Structured cache key, e.g. `["applications", "uid-1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    entity: &'static str,
    scope: Option<String>,
}

impl QueryKey {
    pub fn new(entity: &'static str, scope: Option<&str>) -> Self {
        Self {
            entity,
            scope: scope.map(str::to_string),
        }
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "[\"{}\", \"{}\"]", self.entity, scope),
            None => write!(f, "[\"{}\"]", self.entity),
        }
    }
}

/// When a stored value stops being served without a new fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Fresh until explicitly invalidated.
    Never,
    /// Every read fetches again; concurrent reads still share one request.
    Always,
    /// Fresh for the given duration after it was stored.
    After(Duration),
}

impl StalePolicy {
    fn is_stale(&self, updated_at: Instant, now: Instant) -> bool {
        match self {
            StalePolicy::Never => false,
            StalePolicy::Always => true,
            StalePolicy::After(ttl) => now.duration_since(updated_at) >= *ttl,
        }
    }
}

/// Non-blocking view of an entry.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    pub value: Option<Arc<T>>,
    pub is_loading: bool,
    pub is_invalidated: bool,
    pub updated_at: Option<Instant>,
}

struct InFlight {
    seq: u64,
    future: SharedFetch,
}

struct Entry {
    value: Option<CacheValue>,
    updated_at: Option<Instant>,
    /// Sequence number of the stored value.
    stored_seq: u64,
    /// Results issued at or before this sequence number are discarded.
    floor_seq: u64,
    invalidated: bool,
    in_flight: Option<InFlight>,
    subscribers: usize,
    idle_since: Option<Instant>,
}

impl Entry {
    fn new(floor_seq: u64, now: Instant) -> Self {
        Self {
            value: None,
            updated_at: None,
            stored_seq: 0,
            floor_seq,
            invalidated: false,
            in_flight: None,
            subscribers: 0,
            idle_since: Some(now),
        }
    }

    /// Restart the idle timer of an unsubscribed entry.
    fn touch(&mut self, now: Instant) {
        if self.subscribers == 0 {
            self.idle_since = Some(now);
        }
    }

    /// True while some reader still awaits the in-flight request. A request
    /// whose readers were all dropped is held only by the entry itself.
    fn has_live_fetch(&self) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.seq > self.floor_seq && f.future.strong_count() != Some(1))
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    /// Last issued sequence number.
    last_seq: u64,
}

impl CacheState {
    fn entry(&mut self, key: &QueryKey, now: Instant) -> &mut Entry {
        let floor = self.last_seq;
        self.entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(floor, now))
    }
}

/// Shared, cloneable handle to the cache.
#[derive(Clone)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
    gc_time: Duration,
}

impl QueryCache {
    pub fn new(gc_time: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            gc_time,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `key`, fetching with `fetcher` if the entry is missing or stale.
    ///
    /// A reader that joins an in-flight request receives that request's
    /// result, even if a later request ends up stored.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        policy: StalePolicy,
        fetcher: F,
    ) -> Result<Arc<T>, AppError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let (seq, future) = {
            let mut state = self.lock();
            let now = Instant::now();
            let next_seq = state.last_seq + 1;
            let entry = state.entry(key, now);
            entry.touch(now);

            if let (Some(value), Some(updated_at)) = (&entry.value, entry.updated_at) {
                if !entry.invalidated && !policy.is_stale(updated_at, now) {
                    return downcast(key, value.clone());
                }
            }

            let joinable = entry
                .in_flight
                .as_ref()
                .filter(|in_flight| in_flight.seq > entry.floor_seq)
                .map(|in_flight| (in_flight.seq, in_flight.future.clone()));

            if let Some(joined) = joinable {
                tracing::debug!("Joining in-flight fetch for {}", key);
                joined
            } else {
                let future = fetcher()
                    .map(|result| result.map(|value| Arc::new(value) as CacheValue))
                    .boxed()
                    .shared();
                entry.in_flight = Some(InFlight {
                    seq: next_seq,
                    future: future.clone(),
                });
                state.last_seq = next_seq;
                tracing::debug!("Fetching {} (seq {})", key, next_seq);
                (next_seq, future)
            }
        };

        let result = future.await;
        self.complete(key, seq, &result);
        downcast(key, result?)
    }

    fn complete(&self, key: &QueryKey, seq: u64, result: &Result<CacheValue, AppError>) {
        let mut state = self.lock();
        let now = Instant::now();
        let Some(entry) = state.entries.get_mut(key) else {
            tracing::debug!("Dropping result for collected key {}", key);
            return;
        };

        if entry.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            entry.in_flight = None;
        }
        entry.touch(now);

        match result {
            Ok(value) if seq > entry.stored_seq && seq > entry.floor_seq => {
                entry.value = Some(value.clone());
                entry.updated_at = Some(now);
                entry.stored_seq = seq;
                entry.invalidated = false;
            }
            // Another reader of the same request already stored it
            Ok(_) if seq == entry.stored_seq => {}
            Ok(_) => {
                tracing::debug!("Discarding superseded result for {} (seq {})", key, seq);
            }
            Err(e) => {
                // Failed fetches never overwrite; the next read tries again
                tracing::debug!("Fetch for {} failed: {}", key, e);
                entry.invalidated = true;
            }
        }
    }

    /// Current state of `key` without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let mut state = self.lock();
        match state.entries.get_mut(key) {
            Some(entry) => {
                entry.touch(Instant::now());
                QueryState {
                    value: entry
                        .value
                        .clone()
                        .and_then(|value| value.downcast::<T>().ok()),
                    is_loading: entry.has_live_fetch(),
                    is_invalidated: entry.invalidated,
                    updated_at: entry.updated_at,
                }
            }
            None => QueryState {
                value: None,
                is_loading: false,
                is_invalidated: false,
                updated_at: None,
            },
        }
    }

    /// Mark `key` stale. Requests already in flight for it will not be stored.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut state = self.lock();
        let last_seq = state.last_seq;
        if let Some(entry) = state.entries.get_mut(key) {
            entry.invalidated = true;
            entry.floor_seq = last_seq;
            tracing::debug!("Invalidated {}", key);
        }
    }

    /// Mark every key of `entity` stale.
    pub fn invalidate_entity(&self, entity: &str) {
        let mut state = self.lock();
        let last_seq = state.last_seq;
        for (key, entry) in state.entries.iter_mut() {
            if key.entity == entity {
                entry.invalidated = true;
                entry.floor_seq = last_seq;
            }
        }
    }

    /// Register interest in `key`; the entry is kept alive while any
    /// subscription exists.
    pub fn subscribe(&self, key: &QueryKey) -> Subscription {
        let mut state = self.lock();
        let entry = state.entry(key, Instant::now());
        entry.subscribers += 1;
        entry.idle_since = None;

        Subscription {
            state: Arc::clone(&self.state),
            key: key.clone(),
        }
    }

    /// Remove entries that have been idle for longer than the GC time.
    ///
    /// Requests abandoned by every reader are dropped first, so their
    /// entries stop reporting `is_loading` and can be collected.
    pub fn collect_garbage(&self) -> usize {
        let mut state = self.lock();
        let now = Instant::now();
        let gc_time = self.gc_time;
        let before = state.entries.len();

        state.entries.retain(|key, entry| {
            if entry.in_flight.is_some() && !entry.has_live_fetch() {
                tracing::debug!("Dropping abandoned fetch for {}", key);
                entry.in_flight = None;
            }
            let expired = entry.subscribers == 0
                && entry.in_flight.is_none()
                && entry
                    .idle_since
                    .is_some_and(|since| now.duration_since(since) >= gc_time);
            !expired
        });

        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::debug!("Collected {} idle cache entries", removed);
        }
        removed
    }

    /// Run garbage collection every `interval` until the handle is aborted.
    pub fn spawn_gc(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                cache.collect_garbage();
            }
        })
    }

    /// Drop every entry. In-flight results are discarded on arrival.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        tracing::debug!("Query cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: &QueryKey,
    value: CacheValue,
) -> Result<Arc<T>, AppError> {
    value.downcast::<T>().map_err(|_| {
        AppError::Internal(format!("Cached value for {} has an unexpected type", key))
    })
}

/// Keeps a cache entry alive; dropping it starts the idle timer.
pub struct Subscription {
    state: Arc<Mutex<CacheState>>,
    key: QueryKey,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                entry.idle_since = Some(Instant::now());
            }
        }
    }
}
