//! Portal-wide UI state: profile picture override, team and socials.
//!
//! The store is the only owner of team and socials on the client; the
//! query cache never holds copies of them.

use std::sync::Arc;

use super::{Selector, Store};
use crate::models::{Socials, Team};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortalState {
    /// The identity every other field belongs to.
    pub owner: Option<String>,
    pub profile_picture_url: Option<String>,
    pub team: Option<Team>,
    pub socials: Option<Socials>,
}

pub struct PortalStore {
    store: Store<PortalState>,
}

impl Default for PortalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PortalStore {
    pub fn new() -> Self {
        Self {
            store: Store::new(PortalState::default()),
        }
    }

    pub fn snapshot(&self) -> Arc<PortalState> {
        self.store.snapshot()
    }

    pub fn select<T, P>(&self, projection: P) -> Selector<PortalState, T, P>
    where
        P: Fn(&PortalState) -> T,
        T: Clone + PartialEq,
    {
        self.store.select(projection)
    }

    /// Hand the store to `uid`. Fields held for anyone else are dropped.
    pub fn begin_session(&self, uid: &str) -> bool {
        self.store.update(|s| {
            if s.owner.as_deref() == Some(uid) {
                return s.clone();
            }
            PortalState {
                owner: Some(uid.to_string()),
                ..PortalState::default()
            }
        })
    }

    /// Apply `change` only while `uid` owns the store. A write that
    /// resolves after its user signed out is dropped.
    fn update_owned<F>(&self, uid: &str, change: F) -> bool
    where
        F: FnOnce(&PortalState) -> Option<PortalState>,
    {
        self.store.update(|s| {
            if s.owner.as_deref() != Some(uid) {
                return s.clone();
            }
            change(s).unwrap_or_else(|| s.clone())
        })
    }

    pub fn set_profile_picture_url(&self, uid: &str, url: Option<String>) -> bool {
        self.update_owned(uid, |s| {
            Some(PortalState {
                profile_picture_url: url,
                ..s.clone()
            })
        })
    }

    pub fn set_team(&self, uid: &str, team: Option<Team>) -> bool {
        self.update_owned(uid, |s| {
            Some(PortalState {
                team,
                ..s.clone()
            })
        })
    }

    pub fn set_socials(&self, uid: &str, socials: Option<Socials>) -> bool {
        self.update_owned(uid, |s| {
            Some(PortalState {
                socials,
                ..s.clone()
            })
        })
    }

    /// Set socials only if they still equal `expected`. Used to roll back an
    /// optimistic update without clobbering a newer one.
    pub fn replace_socials_if(
        &self,
        uid: &str,
        expected: &Option<Socials>,
        next: Option<Socials>,
    ) -> bool {
        self.update_owned(uid, |s| {
            if &s.socials != expected {
                return None;
            }
            Some(PortalState {
                socials: next,
                ..s.clone()
            })
        })
    }

    /// Clear every field and the owner; called on sign-out.
    pub fn reset(&self) -> bool {
        self.store.update(|_| PortalState::default())
    }
}
