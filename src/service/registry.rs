//! Person registry
//!
//! Delegation target of the person routes. The trait keeps the HTTP
//! surface decoupled from how identities are actually stored.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// A registered person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub person_id: i64,
    pub name: String,
    /// Registration timestamp (unix seconds)
    pub registered_at: i64,
}

impl PersonRecord {
    pub fn new(person_id: i64, name: &str) -> Self {
        let registered_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self {
            person_id,
            name: name.to_string(),
            registered_at,
        }
    }
}

/// Person registry trait
/// Implementations must be thread-safe and async-compatible
#[async_trait]
pub trait PersonRegistry: Send + Sync + 'static {
    /// Store a person record, replacing any existing one with the same id
    async fn register_person(&self, record: PersonRecord) -> Result<()>;

    /// Look up a person by id
    async fn get_registered_person(&self, person_id: i64) -> Result<Option<PersonRecord>>;

    /// Remove a person; returns whether a record was actually removed
    async fn unregister_person(&self, person_id: i64) -> Result<bool>;
}

/// In-memory registry backing the gateway binary and tests
#[derive(Default)]
pub struct MemoryRegistry {
    persons: RwLock<HashMap<i64, PersonRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonRegistry for MemoryRegistry {
    async fn register_person(&self, record: PersonRecord) -> Result<()> {
        self.persons.write().await.insert(record.person_id, record);
        Ok(())
    }

    async fn get_registered_person(&self, person_id: i64) -> Result<Option<PersonRecord>> {
        Ok(self.persons.read().await.get(&person_id).cloned())
    }

    async fn unregister_person(&self, person_id: i64) -> Result<bool> {
        Ok(self.persons.write().await.remove(&person_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_get_unregister_roundtrip() {
        let registry = MemoryRegistry::new();
        registry
            .register_person(PersonRecord::new(42, "Ada"))
            .await
            .unwrap();

        let person = registry.get_registered_person(42).await.unwrap().unwrap();
        assert_eq!(person.person_id, 42);
        assert_eq!(person.name, "Ada");

        assert!(registry.unregister_person(42).await.unwrap());
        assert!(registry.get_registered_person(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unregister_unknown_person_reports_false() {
        let registry = MemoryRegistry::new();
        assert!(!registry.unregister_person(7).await.unwrap());
    }
}
