// Manager-account (MCC) resolution.
//
// Google Ads wants a `login-customer-id` header naming the manager whenever the
// target customer is a client under that manager. Which manager that is can't
// be known up front, so we find it by trial: list what the OAuth identity can
// reach directly, and if the target isn't in there, probe it through each
// accessible account until one answers.
//
// Lookups go memo -> store -> probe. Successful probes are written back to both.
// Everything is scoped by owner (the user whose OAuth identity did the
// probing): what one identity can reach says nothing about another's.

use async_trait::async_trait;
use dashmap::DashMap;

use super::hierarchy_models::{AccessPath, HierarchyError, HierarchyRecord};
use crate::core::google_ads::{AdsAuth, GoogleAdsApi};

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait HierarchyStore: Send + Sync {
    async fn get(
        &self,
        owner: &str,
        customer_id: &str,
    ) -> Result<Option<HierarchyRecord>, HierarchyError>;

    /// Insert or overwrite a single record.
    async fn upsert(&self, owner: &str, record: &HierarchyRecord) -> Result<(), HierarchyError>;

    /// Swap the owner's stored tree for a freshly detected one.
    async fn replace_all(
        &self,
        owner: &str,
        records: &[HierarchyRecord],
    ) -> Result<(), HierarchyError>;

    async fn list(&self, owner: &str) -> Result<Vec<HierarchyRecord>, HierarchyError>;
}

#[async_trait]
impl<T: HierarchyStore + ?Sized> HierarchyStore for Box<T> {
    async fn get(
        &self,
        owner: &str,
        customer_id: &str,
    ) -> Result<Option<HierarchyRecord>, HierarchyError> {
        (**self).get(owner, customer_id).await
    }

    async fn upsert(&self, owner: &str, record: &HierarchyRecord) -> Result<(), HierarchyError> {
        (**self).upsert(owner, record).await
    }

    async fn replace_all(
        &self,
        owner: &str,
        records: &[HierarchyRecord],
    ) -> Result<(), HierarchyError> {
        (**self).replace_all(owner, records).await
    }

    async fn list(&self, owner: &str) -> Result<Vec<HierarchyRecord>, HierarchyError> {
        (**self).list(owner).await
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

type MemoKey = (String, String);

fn memo_key(owner: &str, customer_id: &str) -> MemoKey {
    (owner.to_string(), customer_id.to_string())
}

pub struct ManagerResolver<A: GoogleAdsApi, H: HierarchyStore> {
    pub(super) ads: A,
    pub(super) store: H,
    /// (owner, customer_id) -> how to reach it
    pub(super) memo: DashMap<MemoKey, AccessPath>,
    /// Write probe results back to the store.
    persist: bool,
}

impl<A: GoogleAdsApi, H: HierarchyStore> ManagerResolver<A, H> {
    pub fn new(ads: A, store: H) -> Self {
        Self {
            ads,
            store,
            memo: DashMap::new(),
            persist: true,
        }
    }

    /// Keep probe results in memory only.
    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Work out how `owner` addresses `customer_id`.
    ///
    /// `auth` must be the owner's bare OAuth identity (no login-customer-id).
    /// Candidates are tried sequentially in the order `listAccessibleCustomers`
    /// returns them and the first one that works wins.
    pub async fn resolve(
        &self,
        owner: &str,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<AccessPath, HierarchyError> {
        if let Some(path) = self.memo.get(&memo_key(owner, customer_id)) {
            return Ok(path.clone());
        }

        if let Some(record) = self.store.get(owner, customer_id).await? {
            let path = record.access_path();
            self.memo.insert(memo_key(owner, customer_id), path.clone());
            return Ok(path);
        }

        self.discover(owner, auth, customer_id).await
    }

    /// Like `resolve`, but ignores the memo and the stored record and asks
    /// Google again. Whatever is found replaces the stored pair.
    pub async fn resolve_fresh(
        &self,
        owner: &str,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<AccessPath, HierarchyError> {
        self.invalidate(owner, customer_id);
        self.discover(owner, auth, customer_id).await
    }

    async fn discover(
        &self,
        owner: &str,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<AccessPath, HierarchyError> {
        let accessible = self.ads.list_accessible_customers(auth).await?;

        if accessible.iter().any(|id| id == customer_id) {
            self.remember_direct(owner, customer_id).await?;
            return Ok(AccessPath::Direct);
        }

        for candidate in &accessible {
            let probe_auth = auth.acting_as(Some(candidate));
            match self.ads.probe_customer(&probe_auth, customer_id).await {
                Ok(()) => {
                    tracing::info!(
                        owner,
                        customer_id,
                        manager_id = candidate.as_str(),
                        "resolved login-customer-id by probing"
                    );
                    self.remember(owner, customer_id, candidate).await?;
                    return Ok(AccessPath::ViaManager(candidate.clone()));
                }
                Err(e) => {
                    tracing::debug!(
                        customer_id,
                        manager_id = candidate.as_str(),
                        "probe failed: {}",
                        e
                    );
                }
            }
        }

        Err(HierarchyError::NoAccessPath(customer_id.to_string()))
    }

    async fn remember(
        &self,
        owner: &str,
        customer_id: &str,
        manager_id: &str,
    ) -> Result<(), HierarchyError> {
        if self.persist {
            // Manager first so the stored tree never has a dangling client.
            let manager = match self.store.get(owner, manager_id).await? {
                Some(existing) if existing.is_manager => None,
                Some(mut existing) => {
                    existing.is_manager = true;
                    Some(existing)
                }
                None => Some(HierarchyRecord::manager(manager_id, None)),
            };
            if let Some(manager) = manager {
                self.store.upsert(owner, &manager).await?;
            }

            let mut client = HierarchyRecord::client_of(customer_id, manager_id, None);
            if let Some(existing) = self.store.get(owner, customer_id).await? {
                client.is_manager = existing.is_manager;
            }
            self.store.upsert(owner, &client).await?;
        }

        self.memo.insert(
            memo_key(owner, customer_id),
            AccessPath::ViaManager(manager_id.to_string()),
        );
        Ok(())
    }

    /// A directly reachable customer only needs storing if an older record
    /// still sends it through a manager.
    async fn remember_direct(&self, owner: &str, customer_id: &str) -> Result<(), HierarchyError> {
        if self.persist {
            if let Some(mut existing) = self.store.get(owner, customer_id).await? {
                if existing.manager_customer_id.is_some() {
                    existing.manager_customer_id = None;
                    existing.level = 0;
                    self.store.upsert(owner, &existing).await?;
                }
            }
        }
        self.memo
            .insert(memo_key(owner, customer_id), AccessPath::Direct);
        Ok(())
    }

    /// Record that nothing but direct access is left to try, so later lookups
    /// don't probe again. Memo only; `invalidate` or `resolve_fresh` undo it.
    pub fn assume_direct(&self, owner: &str, customer_id: &str) {
        self.memo
            .insert(memo_key(owner, customer_id), AccessPath::Direct);
    }

    /// Forget what we know about one customer (memo only; the store keeps it
    /// until the next detection pass or `resolve_fresh`).
    pub fn invalidate(&self, owner: &str, customer_id: &str) {
        self.memo.remove(&memo_key(owner, customer_id));
    }

    /// Drop every memoized answer for one owner.
    pub fn clear_owner(&self, owner: &str) {
        self.memo.retain(|(memo_owner, _), _| memo_owner != owner);
    }

    pub fn clear(&self) {
        self.memo.clear();
    }

    pub async fn stored_hierarchy(
        &self,
        owner: &str,
    ) -> Result<Vec<HierarchyRecord>, HierarchyError> {
        self.store.list(owner).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
