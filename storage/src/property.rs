//! Property store abstraction: typed values under a scope and a string key.
//!
//! Keys are composed by callers (`prefix + semantic name + identifiers`); the store treats them
//! as opaque.

use std::fmt;

use async_trait::async_trait;
use gate_core::UserId;

use crate::error::StorageError;

/// Who a property belongs to: one user, or the bot as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    User(UserId),
    Bot,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User(id) => write!(f, "user:{}", id),
            Scope::Bot => f.write_str("bot"),
        }
    }
}

/// Stored value; the variant is the type hint persisted next to the value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    Json(serde_json::Value),
}

impl PropertyValue {
    pub fn type_hint(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Text(_) => "text",
            PropertyValue::Json(_) => "json",
        }
    }

    /// Serializes the value to its text column form.
    pub fn encode(&self) -> Result<String, StorageError> {
        Ok(match self {
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Text(s) => s.clone(),
            PropertyValue::Json(v) => serde_json::to_string(v)?,
        })
    }

    /// Inverse of [`PropertyValue::encode`] given the persisted type hint.
    pub fn decode(type_hint: &str, raw: &str) -> Result<Self, StorageError> {
        let bad =
            || StorageError::Serialization(format!("cannot decode {:?} as {}", raw, type_hint));
        match type_hint {
            "bool" => raw.parse().map(PropertyValue::Bool).map_err(|_| bad()),
            "integer" => raw.parse().map(PropertyValue::Integer).map_err(|_| bad()),
            "text" => Ok(PropertyValue::Text(raw.to_string())),
            "json" => Ok(PropertyValue::Json(serde_json::from_str(raw)?)),
            other => Err(StorageError::Serialization(format!(
                "unknown type hint: {}",
                other
            ))),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Per-scope key-value storage. Writes to a single key are last-write-wins.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<PropertyValue>, StorageError>;

    async fn set(&self, scope: Scope, key: &str, value: PropertyValue) -> Result<(), StorageError>;

    /// Like [`PropertyStore::get`] but falls back to `default` when the key is absent.
    async fn get_or(
        &self,
        scope: Scope,
        key: &str,
        default: PropertyValue,
    ) -> Result<PropertyValue, StorageError> {
        Ok(self.get(scope, key).await?.unwrap_or(default))
    }
}
