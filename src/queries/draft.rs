//! The signed-in user's draft. Always stale: every read fetches so the
//! latest edit is visible.

use futures::FutureExt;

use super::{entities, Query, QueryContext};
use crate::cache::StalePolicy;
use crate::models::Application;

pub type DraftQuery = Query<Option<Application>>;

impl DraftQuery {
    pub fn new(ctx: QueryContext) -> Self {
        Self::with_loader(
            ctx,
            entities::DRAFT,
            StalePolicy::Always,
            |backend, uid, year| async move { backend.get_draft(&uid, year).await }.boxed(),
        )
    }
}
