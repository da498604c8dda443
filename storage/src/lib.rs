//! Storage crate: key-value property storage and the membership record cache built on it.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`property`] – Scope, PropertyValue and the PropertyStore trait
//! - [`inmemory`] – InMemoryPropertyStore
//! - [`sqlite_store`] – SqlitePropertyStore
//! - [`sqlite_pool`] – SqlitePoolManager
//! - [`membership_store`] – MembershipStore and MembershipRecord

mod error;
mod inmemory;
mod membership_store;
mod property;
mod sqlite_pool;
mod sqlite_store;

pub use error::StorageError;
pub use inmemory::InMemoryPropertyStore;
pub use membership_store::{MembershipRecord, MembershipStore};
pub use property::{PropertyStore, PropertyValue, Scope};
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqlitePropertyStore;
