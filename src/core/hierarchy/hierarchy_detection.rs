use std::collections::HashSet;

use super::hierarchy_models::{validate_hierarchy, HierarchyError, HierarchyRecord};
use super::manager_resolver::{HierarchyStore, ManagerResolver};
use crate::core::google_ads::{AdsAuth, GoogleAdsApi};

impl<A: GoogleAdsApi, H: HierarchyStore> ManagerResolver<A, H> {
    /// Walk every account `owner`'s identity reaches and rebuild their stored
    /// manager/client tree. Other owners' trees are left alone.
    ///
    /// Accounts that can't be described are skipped. A client listed under
    /// several managers is attached to the first one seen.
    pub async fn detect_hierarchy(
        &self,
        owner: &str,
        auth: &AdsAuth,
    ) -> Result<Vec<HierarchyRecord>, HierarchyError> {
        let accessible = self.ads.list_accessible_customers(auth).await?;
        tracing::info!(owner, accounts = accessible.len(), "Detecting account hierarchy");

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut managers = Vec::new();

        for customer_id in &accessible {
            let own_auth = auth.acting_as(Some(customer_id));
            let info = match self.ads.get_customer_info(&own_auth, customer_id).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(customer_id = customer_id.as_str(), "Skipping account: {}", e);
                    continue;
                }
            };

            let mut record = HierarchyRecord::manager(customer_id, info.descriptive_name);
            record.is_manager = info.is_manager;
            if info.is_manager {
                managers.push(customer_id.clone());
            }
            seen.insert(customer_id.clone());
            records.push(record);
        }

        for manager_id in &managers {
            let manager_auth = auth.acting_as(Some(manager_id));
            let clients = match self.ads.list_client_accounts(&manager_auth, manager_id).await {
                Ok(clients) => clients,
                Err(e) => {
                    tracing::warn!(
                        manager_id = manager_id.as_str(),
                        "Could not list client accounts: {}",
                        e
                    );
                    continue;
                }
            };

            for client in clients.into_iter().filter(|c| c.level == 1) {
                if seen.insert(client.customer_id.clone()) {
                    records.push(HierarchyRecord::client_of(
                        &client.customer_id,
                        manager_id,
                        client.descriptive_name,
                    ));
                }
            }
        }

        validate_hierarchy(&records)?;
        self.store.replace_all(owner, &records).await?;
        self.clear_owner(owner);

        tracing::info!(
            owner,
            managers = managers.len(),
            records = records.len(),
            "Account hierarchy stored"
        );
        Ok(records)
    }
}
