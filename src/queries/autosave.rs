//! Debounced draft autosave.
//!
//! Edits are merged into a single pending draft; the debounced flush writes
//! whatever is pending when the window closes, so no edit is lost when
//! several partial saves arrive inside one window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use super::{entities, QueryContext};
use crate::cache::QueryKey;
use crate::errors::AppError;
use crate::models::{events, Application};
use crate::remote::log_event_detached;
use crate::util::Debouncer;

type Pending = Arc<Mutex<Option<Application>>>;

pub struct DraftAutosave {
    debouncer: Debouncer,
    pending: Pending,
}

impl DraftAutosave {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// The unsaved draft for `uid`, if one is waiting.
    pub fn pending(&self, uid: &str) -> Option<Application> {
        lock(&self.pending)
            .as_ref()
            .filter(|draft| draft.applicant_id == uid)
            .cloned()
    }

    /// Replace the pending draft and restart the window.
    pub fn schedule(&self, ctx: &QueryContext, draft: Application) {
        *lock(&self.pending) = Some(draft);

        let ctx = ctx.clone();
        let pending = Arc::clone(&self.pending);
        self.debouncer.call(move || async move {
            if let Err(e) = flush(&ctx, &pending).await {
                tracing::warn!("Draft autosave failed: {}", e);
                log_event_detached(
                    Arc::clone(&ctx.backend),
                    events::WRITE_ERROR,
                    serde_json::json!({ "operation": "autosave", "error": e.to_string() }),
                );
            }
        });
    }

    /// Write the pending draft immediately, skipping the window.
    pub async fn flush_now(&self, ctx: &QueryContext) -> Result<Option<Application>, AppError> {
        self.debouncer.cancel();
        flush(ctx, &self.pending).await
    }

    /// Forget the pending draft without writing it.
    pub fn discard(&self) {
        self.debouncer.cancel();
        lock(&self.pending).take();
    }
}

async fn flush(ctx: &QueryContext, pending: &Pending) -> Result<Option<Application>, AppError> {
    let Some(draft) = lock(pending).take() else {
        return Ok(None);
    };

    match ctx.backend.save_draft(&draft).await {
        Ok(saved) => {
            ctx.cache
                .invalidate(&QueryKey::new(entities::DRAFT, Some(&saved.applicant_id)));
            Ok(Some(saved))
        }
        Err(e) => {
            // Put it back unless a newer edit already replaced it.
            lock(pending).get_or_insert(draft);
            Err(e)
        }
    }
}

fn lock(pending: &Pending) -> std::sync::MutexGuard<'_, Option<Application>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}
