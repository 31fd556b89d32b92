//! Per-entity hooks over the query cache.
//!
//! A hook derives its cache key from the signed-in user, reads through the
//! cache with the entity's staleness policy, and turns failures into the
//! entity's empty value. With nobody signed in it resolves to the empty
//! value without touching the backend.

mod applications;
mod autosave;
mod draft;
mod profile_picture;

pub use applications::ApplicationsQuery;
pub use autosave::DraftAutosave;
pub use draft::DraftQuery;
pub use profile_picture::ProfilePictureQuery;

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;

use crate::auth::Session;
use crate::cache::{QueryCache, QueryKey, QueryState, StalePolicy, Subscription};
use crate::errors::AppError;
use crate::models::events;
use crate::remote::{log_event_detached, Backend};
use crate::store::PortalStore;

/// Cache entity names.
pub mod entities {
    pub const APPLICATIONS: &str = "applications";
    pub const DRAFT: &str = "draft";
    pub const PROFILE_PICTURE: &str = "profile-picture";
}

/// Everything a hook needs, injected once and shared by all hooks.
#[derive(Clone)]
pub struct QueryContext {
    pub backend: Arc<dyn Backend>,
    pub cache: QueryCache,
    pub session: Arc<Session>,
    pub store: Arc<PortalStore>,
    pub year: i32,
    /// Entries held for the whole session, released on sign-out.
    pub pinned: Arc<Mutex<Vec<Subscription>>>,
}

impl QueryContext {
    pub fn new(
        backend: Arc<dyn Backend>,
        cache: QueryCache,
        session: Arc<Session>,
        store: Arc<PortalStore>,
        year: i32,
    ) -> Self {
        Self {
            backend,
            cache,
            session,
            store,
            year,
            pinned: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Keep the signed-in user's session-long entries from being collected
    /// between reads.
    pub fn pin_session(&self) {
        let Some(subscription) = self.applications().subscribe() else {
            return;
        };
        let previous = std::mem::replace(&mut *self.lock_pinned(), vec![subscription]);
        drop(previous);
    }

    /// Release the session pins. Call before clearing the cache.
    pub fn unpin_session(&self) {
        let previous = std::mem::take(&mut *self.lock_pinned());
        drop(previous);
    }

    fn lock_pinned(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.pinned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn applications(&self) -> ApplicationsQuery {
        ApplicationsQuery::new(self.clone())
    }

    pub fn draft(&self) -> DraftQuery {
        DraftQuery::new(self.clone())
    }

    pub fn profile_picture(&self) -> ProfilePictureQuery {
        ProfilePictureQuery::new(self.clone())
    }
}

type Loader<T> = fn(Arc<dyn Backend>, String, i32) -> BoxFuture<'static, Result<T, AppError>>;

/// A cached read of one entity for the signed-in user.
pub struct Query<T> {
    ctx: QueryContext,
    entity: &'static str,
    policy: StalePolicy,
    load: Loader<T>,
}

impl<T> Query<T>
where
    T: Default + Send + Sync + 'static,
{
    fn with_loader(
        ctx: QueryContext,
        entity: &'static str,
        policy: StalePolicy,
        load: Loader<T>,
    ) -> Self {
        Self {
            ctx,
            entity,
            policy,
            load,
        }
    }

    /// Cache key for the current identity.
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.entity, self.ctx.session.uid().as_deref())
    }

    /// Read the value, fetching if the policy says the entry is stale.
    /// Failures resolve to the empty value and are reported.
    pub async fn fetch(&self) -> Arc<T> {
        if self.ctx.session.uid().is_none() {
            return Arc::new(T::default());
        }
        let key = self.key();

        match self.try_fetch().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", key, e);
                log_event_detached(
                    Arc::clone(&self.ctx.backend),
                    events::FETCH_ERROR,
                    serde_json::json!({ "key": key.to_string(), "error": e.to_string() }),
                );
                Arc::new(T::default())
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but a failed or signed-out read is an
    /// error. Writers use this so they never build on a value that was
    /// not actually read.
    pub async fn try_fetch(&self) -> Result<Arc<T>, AppError> {
        let uid = self.ctx.session.require()?.uid;

        let key = QueryKey::new(self.entity, Some(&uid));
        let backend = Arc::clone(&self.ctx.backend);
        let load = self.load;
        let year = self.ctx.year;

        self.ctx
            .cache
            .fetch(&key, self.policy, move || load(backend, uid, year))
            .await
    }

    /// Current value and loading flag, without fetching.
    pub fn state(&self) -> QueryState<T> {
        if self.ctx.session.uid().is_none() {
            return QueryState {
                value: Some(Arc::new(T::default())),
                is_loading: false,
                is_invalidated: false,
                updated_at: None,
            };
        }
        self.ctx.cache.peek(&self.key())
    }

    /// Mark this entity stale for the current user; the next read fetches.
    pub fn refresh(&self) {
        self.ctx.cache.invalidate(&self.key());
    }

    /// Keep the entry alive while the returned handle exists.
    pub fn subscribe(&self) -> Option<Subscription> {
        self.ctx
            .session
            .uid()
            .map(|_| self.ctx.cache.subscribe(&self.key()))
    }
}
