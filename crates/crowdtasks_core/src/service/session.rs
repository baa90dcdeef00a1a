//! Current-actor lookup.
//!
//! Authentication itself lives outside the core; services only ask who is
//! signed in right now.

use crate::model::UserId;
use std::sync::{PoisonError, RwLock};

/// Source of the signed-in user.
pub trait Session: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;
}

/// Session whose user is set by the host after it authenticates.
#[derive(Debug, Default)]
pub struct SharedSession {
    user_id: RwLock<Option<UserId>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Session for SharedSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
