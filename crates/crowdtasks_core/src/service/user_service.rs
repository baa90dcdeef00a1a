//! Profile intent operations for the signed-in user.
//!
//! # Invariants
//! - Every operation targets the session's current user only.
//! - Push tokens are stored as a set; adding a known token is a no-op.

use crate::error::{CoreError, CoreResult};
use crate::model::member::{normalize_display_name, User, PUSH_TOKENS_FIELD};
use crate::model::UserId;
use crate::service::session::Session;
use crate::store::document::{self, FieldPatch};
use crate::store::source::DocumentStore;
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

pub struct UserService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    session: Arc<dyn Session>,
}

impl<S: DocumentStore + ?Sized> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: DocumentStore + ?Sized> UserService<S> {
    pub fn new(store: Arc<S>, session: Arc<dyn Session>) -> Self {
        Self { store, session }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.session.current_user_id()
    }

    fn require_actor(&self) -> CoreResult<UserId> {
        self.session
            .current_user_id()
            .ok_or(CoreError::Unauthenticated)
    }

    /// Loads the signed-in user's profile, `None` if none exists yet.
    pub async fn current_user(&self) -> CoreResult<Option<User>> {
        let actor = self.require_actor()?;
        match self.store.get(&document::user(&actor)).await? {
            Some(doc) => Ok(Some(User::from_document(&doc)?)),
            None => Ok(None),
        }
    }

    /// Returns the profile, creating one from the sign-in email on first use.
    pub async fn ensure_profile(&self, email: &str) -> CoreResult<User> {
        if let Some(user) = self.current_user().await? {
            return Ok(user);
        }
        let actor = self.require_actor()?;
        let user = User::from_sign_in(actor, email);
        self.store
            .set(&document::user(&user.id), user.to_fields()?)
            .await?;
        info!(
            "event=profile_create module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    pub async fn update_user_name(&self, name: &str) -> CoreResult<()> {
        let actor = self.require_actor()?;
        let name = normalize_display_name(name)?;
        self.store
            .update(&document::user(&actor), FieldPatch::new().set("name", name))
            .await?;
        debug!(
            "event=profile_rename module=service status=ok user_id={}",
            actor
        );
        Ok(())
    }

    /// Registers a push-notification token for this device.
    pub async fn add_push_token(&self, token: &str) -> CoreResult<()> {
        let actor = self.require_actor()?;
        let patch = FieldPatch::new()
            .array_union(PUSH_TOKENS_FIELD, vec![Value::String(token.to_string())]);
        self.store.update(&document::user(&actor), patch).await?;
        Ok(())
    }

    pub async fn remove_push_token(&self, token: &str) -> CoreResult<()> {
        let actor = self.require_actor()?;
        let patch = FieldPatch::new()
            .array_remove(PUSH_TOKENS_FIELD, vec![Value::String(token.to_string())]);
        self.store.update(&document::user(&actor), patch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::UserService;
    use crate::error::CoreError;
    use crate::service::session::SharedSession;
    use crate::store::memory::InMemoryDocumentStore;
    use std::sync::Arc;

    fn service(user: Option<&str>) -> UserService<InMemoryDocumentStore> {
        let session = match user {
            Some(id) => SharedSession::signed_in(id),
            None => SharedSession::new(),
        };
        UserService::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(session))
    }

    #[tokio::test]
    async fn ensure_profile_creates_once_then_reuses() {
        let users = service(Some("u1"));
        let created = users.ensure_profile("ada@example.com").await.unwrap();
        assert_eq!(created.name, "ada");

        users.update_user_name("  Ada L  ").await.unwrap();
        let again = users.ensure_profile("other@example.com").await.unwrap();
        assert_eq!(again.name, "Ada L");
        assert_eq!(again.email, "ada@example.com");
    }

    #[tokio::test]
    async fn push_tokens_behave_as_a_set() {
        let users = service(Some("u1"));
        users.ensure_profile("ada@example.com").await.unwrap();
        users.add_push_token("tok-a").await.unwrap();
        users.add_push_token("tok-a").await.unwrap();
        users.add_push_token("tok-b").await.unwrap();
        users.remove_push_token("tok-a").await.unwrap();

        let user = users.current_user().await.unwrap().unwrap();
        assert_eq!(user.push_tokens, vec!["tok-b".to_string()]);
    }

    #[tokio::test]
    async fn operations_require_a_signed_in_user() {
        let users = service(None);
        assert_eq!(users.current_user().await, Err(CoreError::Unauthenticated));
        assert_eq!(
            users.update_user_name("Ada").await,
            Err(CoreError::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let users = service(Some("u1"));
        users.ensure_profile("ada@example.com").await.unwrap();
        assert!(matches!(
            users.update_user_name("   ").await,
            Err(CoreError::Validation(_))
        ));
    }
}
