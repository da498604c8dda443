//! Membership record cache on top of a [`PropertyStore`].
//!
//! One boolean per (user, chat), stored in the user's scope under
//! `MembershipChecker_joined_<chat>`. Records are overwritten on every check and never deleted;
//! readers trust the last write.

use std::sync::Arc;

use gate_core::{ChatRef, UserId};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::property::{PropertyStore, PropertyValue, Scope};

const KEY_PREFIX: &str = "MembershipChecker_";

/// Last known membership of one user in one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRecord {
    pub user_id: UserId,
    pub chat: ChatRef,
    pub joined: bool,
}

#[derive(Clone)]
pub struct MembershipStore {
    store: Arc<dyn PropertyStore>,
}

impl MembershipStore {
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self { store }
    }

    /// Storage key for a chat's record.
    pub fn key(chat: &ChatRef) -> String {
        format!("{}joined_{}", KEY_PREFIX, chat)
    }

    /// Writes the record, replacing any previous one for the same (user, chat).
    pub async fn save(&self, record: &MembershipRecord) -> Result<(), StorageError> {
        self.store
            .set(
                Scope::User(record.user_id),
                &Self::key(&record.chat),
                PropertyValue::Bool(record.joined),
            )
            .await?;
        debug!(
            user_id = record.user_id.0,
            chat = %record.chat,
            joined = record.joined,
            "Saved membership record"
        );
        Ok(())
    }

    /// Returns the cached value, or `None` if the chat was never recorded for this user.
    pub async fn lookup(
        &self,
        user_id: UserId,
        chat: &ChatRef,
    ) -> Result<Option<bool>, StorageError> {
        let Some(value) = self.store.get(Scope::User(user_id), &Self::key(chat)).await? else {
            return Ok(None);
        };
        if value.as_bool().is_none() {
            warn!(
                user_id = user_id.0,
                chat = %chat,
                value_type = value.type_hint(),
                "Membership record is not a bool, treating as absent"
            );
        }
        Ok(value.as_bool())
    }

    /// Chats without a cached "member" record, in input order.
    pub async fn missing(
        &self,
        chats: &[ChatRef],
        user_id: UserId,
    ) -> Result<Vec<ChatRef>, StorageError> {
        let mut missing = Vec::new();
        for chat in chats {
            if self.lookup(user_id, chat).await? != Some(true) {
                missing.push(chat.clone());
            }
        }
        Ok(missing)
    }
}
