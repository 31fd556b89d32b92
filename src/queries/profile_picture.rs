//! Profile picture URL, with the store's override taking precedence over
//! the stored picture and the identity's photo.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;

use super::{entities, Query, QueryContext};
use crate::cache::StalePolicy;

const PICTURE_TTL: Duration = Duration::from_secs(5 * 60);

pub struct ProfilePictureQuery {
    query: Query<Option<String>>,
    ctx: QueryContext,
}

impl ProfilePictureQuery {
    pub fn new(ctx: QueryContext) -> Self {
        let query = Query::<Option<String>>::with_loader(
            ctx.clone(),
            entities::PROFILE_PICTURE,
            StalePolicy::After(PICTURE_TTL),
            |backend, uid, _year| {
                async move { backend.get_profile_picture_url(&uid).await }.boxed()
            },
        );
        Self { query, ctx }
    }

    /// The URL to display, if any.
    pub async fn fetch(&self) -> Option<String> {
        let uid = self.ctx.session.uid();
        let snapshot = self.ctx.store.snapshot();
        if uid.is_some() && snapshot.owner == uid {
            if let Some(url) = &snapshot.profile_picture_url {
                return Some(url.clone());
            }
        }
        let stored: Arc<Option<String>> = self.query.fetch().await;
        (*stored)
            .clone()
            .or_else(|| self.ctx.session.current().and_then(|u| u.photo_url))
    }

    pub fn refresh(&self) {
        self.query.refresh();
    }
}
