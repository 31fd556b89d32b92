//! The signed-in identity for this portal process.

use std::sync::{PoisonError, RwLock};

use crate::errors::AppError;
use crate::models::CurrentUser;

/// Holds the identity projection issued by the auth provider.
#[derive(Default)]
pub struct Session {
    user: RwLock<Option<CurrentUser>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current user, if anyone is signed in.
    pub fn current(&self) -> Option<CurrentUser> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn uid(&self) -> Option<String> {
        self.current().map(|u| u.uid)
    }

    /// The current user, or `Unauthorized` when signed out.
    pub fn require(&self) -> Result<CurrentUser, AppError> {
        self.current()
            .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
    }

    /// Replace the identity, returning the previous one.
    pub fn sign_in(&self, user: CurrentUser) -> Option<CurrentUser> {
        self.user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(user)
    }

    pub fn sign_out(&self) -> Option<CurrentUser> {
        self.user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
