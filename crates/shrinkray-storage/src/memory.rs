use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::RwLock;
use shrinkray_core::storage::Result;
use shrinkray_core::{Storage, StorageError, Token, UrlRecord};
use std::collections::HashMap;

/// In-memory storage entry for a token.
#[derive(Debug, Clone)]
struct Entry {
    full_url: String,
    created_at: Timestamp,
}

#[derive(Debug, Default)]
struct Maps {
    by_token: HashMap<String, Entry>,
    by_url: HashMap<String, Token>,
}

/// In-memory implementation of the [`Storage`] trait.
///
/// Both directions of the mapping live behind one `RwLock` so a save updates
/// them atomically. Lookups share the read lock; saves take the write lock
/// and check both maps before inserting.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    maps: RwLock<Maps>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory storage with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            maps: RwLock::new(Maps {
                by_token: HashMap::with_capacity(capacity),
                by_url: HashMap::with_capacity(capacity),
            }),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.maps.read().by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn resolve(&self, token: &Token) -> Result<Option<UrlRecord>> {
        let maps = self.maps.read();

        Ok(maps.by_token.get(token.as_str()).map(|entry| UrlRecord {
            token: token.clone(),
            full_url: entry.full_url.clone(),
            created_at: entry.created_at,
        }))
    }

    async fn find_token(&self, full_url: &str) -> Result<Option<Token>> {
        Ok(self.maps.read().by_url.get(full_url).cloned())
    }

    async fn save(&self, full_url: &str, token: &Token) -> Result<()> {
        let mut maps = self.maps.write();

        if maps.by_token.contains_key(token.as_str()) {
            return Err(StorageError::TokenConflict(token.to_string()));
        }
        if maps.by_url.contains_key(full_url) {
            return Err(StorageError::UrlConflict(full_url.to_owned()));
        }

        maps.by_token.insert(
            token.as_str().to_owned(),
            Entry {
                full_url: full_url.to_owned(),
                created_at: Timestamp::now(),
            },
        );
        maps.by_url.insert(full_url.to_owned(), token.clone());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
