//! Profile reducer.

use crate::model::member::User;

/// Client-local parameters of the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileParams {
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileState {
    pub is_loading: bool,
    /// `None` when the signed-in user has no profile document yet.
    pub user: Option<User>,
    pub error_message: Option<String>,
}

impl ProfileState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            user: None,
            error_message: None,
        }
    }

    pub fn failed(last_good: Option<Self>, message: String) -> Self {
        let mut state = last_good.unwrap_or_else(Self::loading);
        state.is_loading = false;
        state.error_message = Some(message);
        state
    }
}

pub fn reduce_profile(user: Option<&User>, params: &ProfileParams) -> ProfileState {
    ProfileState {
        is_loading: false,
        user: user.cloned(),
        error_message: params.error_message.clone(),
    }
}
