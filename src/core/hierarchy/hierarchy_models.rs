use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::google_ads::AdsError;

#[derive(Debug, Error)]
pub enum HierarchyError {
    /// Neither direct access nor any accessible manager reaches the customer.
    #[error("No valid access path to customer {0}")]
    NoAccessPath(String),

    #[error("Customer {customer_id} points at manager {manager_customer_id}, which is not a recorded manager")]
    InvariantViolation {
        customer_id: String,
        manager_customer_id: String,
    },

    #[error("Hierarchy storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Ads(#[from] AdsError),
}

/// One node of the two-level manager/client tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRecord {
    pub customer_id: String,
    pub manager_customer_id: Option<String>,
    pub is_manager: bool,
    /// 0 for accounts reached directly, 1 for clients reached through a manager.
    pub level: u32,
    pub account_name: Option<String>,
}

impl HierarchyRecord {
    pub fn manager(customer_id: &str, account_name: Option<String>) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            manager_customer_id: None,
            is_manager: true,
            level: 0,
            account_name,
        }
    }

    pub fn client_of(customer_id: &str, manager_id: &str, account_name: Option<String>) -> Self {
        Self {
            customer_id: customer_id.to_string(),
            manager_customer_id: Some(manager_id.to_string()),
            is_manager: false,
            level: 1,
            account_name,
        }
    }

    pub fn access_path(&self) -> AccessPath {
        match &self.manager_customer_id {
            Some(manager) => AccessPath::ViaManager(manager.clone()),
            None => AccessPath::Direct,
        }
    }
}

/// How calls against a customer must be addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "managerId", rename_all = "camelCase")]
pub enum AccessPath {
    /// Directly accessible; no login-customer-id header.
    Direct,
    /// Reached through this manager, which goes in login-customer-id.
    ViaManager(String),
}

impl AccessPath {
    pub fn login_customer_id(&self) -> Option<&str> {
        match self {
            AccessPath::Direct => None,
            AccessPath::ViaManager(manager) => Some(manager.as_str()),
        }
    }
}

/// Every client's manager must itself be recorded as a manager.
pub fn validate_hierarchy(records: &[HierarchyRecord]) -> Result<(), HierarchyError> {
    let by_id: HashMap<&str, &HierarchyRecord> = records
        .iter()
        .map(|r| (r.customer_id.as_str(), r))
        .collect();

    for record in records {
        if let Some(manager_id) = record.manager_customer_id.as_deref() {
            let is_recorded_manager = by_id.get(manager_id).is_some_and(|m| m.is_manager);
            if !is_recorded_manager {
                return Err(HierarchyError::InvariantViolation {
                    customer_id: record.customer_id.clone(),
                    manager_customer_id: manager_id.to_string(),
                });
            }
        }
    }

    Ok(())
}
