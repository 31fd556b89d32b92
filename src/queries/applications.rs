//! Submitted applications of the signed-in user.
//!
//! Valid for the whole session: submitting changes the data, so callers
//! must `refresh()` after a submission.

use futures::FutureExt;

use super::{entities, Query, QueryContext};
use crate::cache::StalePolicy;
use crate::models::Application;

pub type ApplicationsQuery = Query<Vec<Application>>;

impl ApplicationsQuery {
    pub fn new(ctx: QueryContext) -> Self {
        Self::with_loader(
            ctx,
            entities::APPLICATIONS,
            StalePolicy::Never,
            |backend, uid, year| async move { backend.list_applications(&uid, year).await }.boxed(),
        )
    }
}
