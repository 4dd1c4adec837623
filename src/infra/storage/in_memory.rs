// DashMap-backed stores. Used with STORAGE_BACKEND=memory and by the tests.
// Nothing survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::core::credentials::{AccessToken, CredentialError, CredentialStore, UserCredentials};
use crate::core::hierarchy::{HierarchyError, HierarchyRecord, HierarchyStore};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    /// user_id -> credentials
    data: DashMap<String, UserCredentials>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserCredentials>, CredentialError> {
        Ok(self.data.get(user_id).map(|entry| entry.clone()))
    }

    async fn save(&self, credentials: &UserCredentials) -> Result<(), CredentialError> {
        self.data
            .insert(credentials.user_id.clone(), credentials.clone());
        Ok(())
    }

    async fn update_access_token(
        &self,
        user_id: &str,
        token: &AccessToken,
    ) -> Result<(), CredentialError> {
        if let Some(mut entry) = self.data.get_mut(user_id) {
            entry.access_token = Some(token.token.clone());
            entry.token_expires_at = Some(token.expires_at);
            entry.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryHierarchyStore {
    /// (owner, customer_id) -> record
    data: DashMap<(String, String), HierarchyRecord>,
}

impl InMemoryHierarchyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(owner: &str, customer_id: &str) -> (String, String) {
    (owner.to_string(), customer_id.to_string())
}

#[async_trait]
impl HierarchyStore for InMemoryHierarchyStore {
    async fn get(
        &self,
        owner: &str,
        customer_id: &str,
    ) -> Result<Option<HierarchyRecord>, HierarchyError> {
        Ok(self.data.get(&key(owner, customer_id)).map(|entry| entry.clone()))
    }

    async fn upsert(&self, owner: &str, record: &HierarchyRecord) -> Result<(), HierarchyError> {
        let entry_key = key(owner, &record.customer_id);
        let mut record = record.clone();
        if record.account_name.is_none() {
            record.account_name = self
                .data
                .get(&entry_key)
                .and_then(|existing| existing.account_name.clone());
        }
        self.data.insert(entry_key, record);
        Ok(())
    }

    async fn replace_all(
        &self,
        owner: &str,
        records: &[HierarchyRecord],
    ) -> Result<(), HierarchyError> {
        self.data.retain(|(record_owner, _), _| record_owner != owner);
        for record in records {
            self.data
                .insert(key(owner, &record.customer_id), record.clone());
        }
        Ok(())
    }

    async fn list(&self, owner: &str) -> Result<Vec<HierarchyRecord>, HierarchyError> {
        let mut records: Vec<HierarchyRecord> = self
            .data
            .iter()
            .filter(|entry| entry.key().0 == owner)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        Ok(records)
    }
}
