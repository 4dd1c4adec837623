use thiserror::Error;

use super::ads_api::{AdsError, GoogleAdsApi};
use super::ads_models::{normalize_customer_id, AdsAuth};
use crate::core::credentials::{CredentialError, CredentialResolver, CredentialStore, TokenProvider};
use crate::core::hierarchy::{AccessPath, HierarchyError, HierarchyStore, ManagerResolver};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Ads(#[from] AdsError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("No customer id given and none configured")]
    MissingCustomerId,
}

/// Everything a handler needs to talk to one customer on behalf of one user.
#[derive(Debug, Clone)]
pub struct AdsSession {
    /// Carries the resolved login-customer-id, if any.
    pub auth: AdsAuth,
    pub customer_id: String,
    pub access_path: AccessPath,
    pub uses_own_credentials: bool,
}

/// Resolve credentials, pick the customer, then work out how to reach it.
///
/// If no manager path is found the session still opens with direct access;
/// the upstream call will then surface its own permission error. That fallback
/// is remembered so later sessions don't repeat the probing.
pub async fn open_session<S, T, A, H>(
    credentials: &CredentialResolver<S, T>,
    managers: &ManagerResolver<A, H>,
    user_id: &str,
    requested_customer_id: Option<&str>,
) -> Result<AdsSession, SessionError>
where
    S: CredentialStore,
    T: TokenProvider,
    A: GoogleAdsApi,
    H: HierarchyStore,
{
    let (auth, resolved) = credentials.resolve_auth(user_id).await?;

    let raw_customer_id = requested_customer_id
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .or(resolved.customer_id)
        .ok_or(SessionError::MissingCustomerId)?;
    let customer_id = normalize_customer_id(&raw_customer_id)?;

    let access_path = match managers.resolve(user_id, &auth, &customer_id).await {
        Ok(path) => path,
        Err(HierarchyError::NoAccessPath(_)) => {
            tracing::warn!(
                user_id,
                customer_id = customer_id.as_str(),
                "No manager account reaches customer, falling back to direct access"
            );
            managers.assume_direct(user_id, &customer_id);
            AccessPath::Direct
        }
        Err(e) => return Err(e.into()),
    };

    Ok(AdsSession {
        auth: auth.acting_as(access_path.login_customer_id()),
        customer_id,
        access_path,
        uses_own_credentials: resolved.uses_own_credentials,
    })
}
