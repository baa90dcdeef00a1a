//! User profile model used to resolve board member ids for display.

use crate::model::validation::{normalize_required, ValidationError};
use crate::model::UserId;
use crate::store::document::{encode_fields, Document, Fields};
use crate::store::source::StoreResult;
use serde::{Deserialize, Serialize};

/// Wire field holding a user's push registration tokens.
pub const PUSH_TOKENS_FIELD: &str = "fcmTokens";

/// `users/{userId}` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(rename = "fcmTokens")]
    pub push_tokens: Vec<String>,
}

impl User {
    /// Builds the profile created on first sign-in.
    ///
    /// The display name defaults to the local part of `email`.
    pub fn from_sign_in(id: impl Into<UserId>, email: &str) -> Self {
        let email = email.trim();
        let name = email.split('@').next().unwrap_or(email).to_string();
        Self {
            id: id.into(),
            name,
            email: email.to_string(),
            push_tokens: Vec::new(),
        }
    }

    pub fn from_document(doc: &Document) -> StoreResult<Self> {
        let mut user: User = doc.decode()?;
        if user.id.trim().is_empty() {
            user.id = doc.id().to_string();
        }
        Ok(user)
    }

    pub fn to_fields(&self) -> StoreResult<Fields> {
        encode_fields(self)
    }
}

/// Normalizes a display name before it is written.
pub fn normalize_display_name(name: &str) -> Result<String, ValidationError> {
    normalize_required("display name", name)
}
