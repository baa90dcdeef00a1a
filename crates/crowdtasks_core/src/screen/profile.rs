//! Profile screen for the signed-in user.

use crate::error::{CoreError, CoreResult};
use crate::model::member::User;
use crate::screen::{failed_immediately, starting_with};
use crate::service::user_service::UserService;
use crate::store::source::{DocumentStore, StoreError};
use crate::sync::combine::{watch_source, CombineLatest, SlotSet};
use crate::sync::streams::user_snapshots;
use crate::view::profile::{reduce_profile, ProfileParams, ProfileState};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use log::warn;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Default)]
struct ProfileSlots {
    user: Option<Option<User>>,
    params: Option<ProfileParams>,
}

enum ProfileUpdate {
    User(Option<User>),
    Params(ProfileParams),
}

impl SlotSet for ProfileSlots {
    type Update = ProfileUpdate;
    type Output = ProfileState;

    fn apply(&mut self, update: ProfileUpdate) {
        match update {
            ProfileUpdate::User(user) => self.user = Some(user),
            ProfileUpdate::Params(params) => self.params = Some(params),
        }
    }

    fn snapshot(&self) -> Option<ProfileState> {
        let user = self.user.as_ref()?;
        Some(reduce_profile(user.as_ref(), self.params.as_ref()?))
    }
}

pub struct ProfileScreen<S: DocumentStore + ?Sized> {
    service: UserService<S>,
    params: Arc<watch::Sender<ProfileParams>>,
}

impl<S: DocumentStore + ?Sized + 'static> ProfileScreen<S> {
    pub fn new(service: UserService<S>) -> Self {
        let (params, _) = watch::channel(ProfileParams::default());
        Self {
            service,
            params: Arc::new(params),
        }
    }

    pub fn states(&self) -> BoxStream<'static, ProfileState> {
        let Some(user_id) = self.service.current_user_id() else {
            return failed_immediately(
                ProfileState::loading(),
                ProfileState::failed(None, CoreError::Unauthenticated.to_string()),
            );
        };

        let combined = CombineLatest::<ProfileSlots, StoreError>::new()
            .with_source(
                user_snapshots(self.service.store().as_ref(), &user_id),
                ProfileUpdate::User,
            )
            .with_source(watch_source(self.params.subscribe()), ProfileUpdate::Params);

        let updates = combined.scan(None::<ProfileState>, move |last_good, item| {
            let state = match item {
                Ok(state) => {
                    *last_good = Some(state.clone());
                    state
                }
                Err(err) => {
                    warn!(
                        "event=profile_stream module=screen status=error user_id={} error={}",
                        user_id, err
                    );
                    ProfileState::failed(last_good.take(), CoreError::from(err).to_string())
                }
            };
            future::ready(Some(state))
        });

        starting_with(ProfileState::loading(), updates)
    }

    pub async fn update_user_name(&self, name: &str) -> CoreResult<()> {
        let result = self.service.update_user_name(name).await;
        match &result {
            Ok(()) => {
                self.params
                    .send_if_modified(|params| params.error_message.take().is_some());
            }
            Err(err) => {
                let message = err.to_string();
                self.params
                    .send_modify(|params| params.error_message = Some(message));
            }
        }
        result
    }
}
