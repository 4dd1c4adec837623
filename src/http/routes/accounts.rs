// Credential setup, account listing and manager-account (MCC) endpoints.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::credentials::{CredentialSetup, CredentialStatus};
use crate::core::google_ads::{normalize_customer_id, CustomerInfo};
use crate::core::hierarchy::{AccessPath, HierarchyRecord};
use crate::http::api_error::{ok, ApiJson, ApiResult, Envelope};
use crate::http::app_state::AppState;
use crate::http::session_auth::AuthUser;

// ============================================================================
// CREDENTIALS
// ============================================================================

pub async fn credential_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<CredentialStatus>>> {
    let status = state.credentials.status(&user.user_id).await?;
    Ok(ok(status))
}

/// Setup and re-auth. Secrets go in, only the status comes back out.
pub async fn save_credentials(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(setup): ApiJson<CredentialSetup>,
) -> ApiResult<Json<Envelope<CredentialStatus>>> {
    let status = state.credentials.save_setup(&user.user_id, setup).await?;
    Ok(ok(status))
}

// ============================================================================
// ACCOUNTS
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountList {
    pub accounts: Vec<CustomerInfo>,
    pub default_customer_id: Option<String>,
}

/// Accounts the user's OAuth identity reaches directly.
pub async fn list_accounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<AccountList>>> {
    let (auth, resolved) = state.credentials.resolve_auth(&user.user_id).await?;
    let ids = state.ads.list_accessible_customers(&auth).await?;

    let mut accounts = Vec::with_capacity(ids.len());
    for id in &ids {
        match state
            .ads
            .get_customer_info(&auth.acting_as(Some(id)), id)
            .await
        {
            Ok(info) => accounts.push(info),
            Err(e) => {
                tracing::warn!(customer_id = id.as_str(), "Skipping account without details: {}", e)
            }
        }
    }

    Ok(ok(AccountList {
        accounts,
        default_customer_id: resolved.customer_id,
    }))
}

// ============================================================================
// MANAGER ACCOUNTS
// ============================================================================

pub async fn detect_hierarchy(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<Vec<HierarchyRecord>>>> {
    let (auth, _) = state.credentials.resolve_auth(&user.user_id).await?;
    let records = state
        .managers
        .detect_hierarchy(&user.user_id, &auth)
        .await?;
    Ok(ok(records))
}

/// The caller's tree as last stored by detection or probing.
pub async fn stored_hierarchy(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Envelope<Vec<HierarchyRecord>>>> {
    let records = state.managers.stored_hierarchy(&user.user_id).await?;
    Ok(ok(records))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub customer_id: String,
    /// Ignore what's remembered and probe again.
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAccess {
    pub customer_id: String,
    pub access_path: AccessPath,
    /// What to send as `login-customer-id`; null means no header.
    pub login_customer_id: Option<String>,
}

pub async fn resolve_manager(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ResolveRequest>,
) -> ApiResult<Json<Envelope<ResolvedAccess>>> {
    let customer_id = normalize_customer_id(&req.customer_id)?;
    let (auth, _) = state.credentials.resolve_auth(&user.user_id).await?;
    let access_path = if req.refresh {
        state
            .managers
            .resolve_fresh(&user.user_id, &auth, &customer_id)
            .await?
    } else {
        state
            .managers
            .resolve(&user.user_id, &auth, &customer_id)
            .await?
    };

    Ok(ok(ResolvedAccess {
        login_customer_id: access_path.login_customer_id().map(str::to_string),
        customer_id,
        access_path,
    }))
}
