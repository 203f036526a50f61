//! Storage backends for the shrinkray URL shortener.
//!
//! Both backends implement [`shrinkray_core::Storage`] and keep the
//! URL/token mapping a bijection: [`InMemoryStorage`] by serializing writes
//! behind a lock, [`PostgresStorage`] through a primary key on the token and a
//! unique index on the URL.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStorage;
pub use postgres::{PostgresSettings, PostgresStorage};
pub use shrinkray_core::{Storage, StorageError, UrlRecord};
