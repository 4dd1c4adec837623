// Credential resolution: decides which developer token and OAuth access token a
// user's Google Ads calls run with. No HTTP or SQL here; the store and the token
// endpoint come in through the two traits below.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::RwLock;

use super::credentials_models::{
    AccessToken, CredentialSetup, CredentialStatus, OAuthClient, ResolvedCredentials,
    SharedCredentials, UserCredentials,
};
use crate::core::google_ads::AdsAuth;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum CredentialError {
    /// Neither personal nor shared credentials exist. The UI sends the user to setup.
    #[error("Google Ads credentials are not configured")]
    NotConfigured,

    /// The refresh token was revoked or expired; the user has to re-authorize.
    #[error("Google authorization expired, please reconnect: {0}")]
    ReauthRequired(String),

    #[error("Invalid credentials: {0}")]
    Invalid(String),

    #[error("OAuth token refresh failed: {0}")]
    OAuth(String),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

// ============================================================================
// PORTS
// ============================================================================

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserCredentials>, CredentialError>;

    async fn save(&self, credentials: &UserCredentials) -> Result<(), CredentialError>;

    /// Persist a freshly minted personal access token.
    async fn update_access_token(
        &self,
        user_id: &str,
        token: &AccessToken,
    ) -> Result<(), CredentialError>;
}

/// Exchanges a refresh token for an access token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn refresh(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<AccessToken, CredentialError>;
}

#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    async fn get(&self, user_id: &str) -> Result<Option<UserCredentials>, CredentialError> {
        (**self).get(user_id).await
    }

    async fn save(&self, credentials: &UserCredentials) -> Result<(), CredentialError> {
        (**self).save(credentials).await
    }

    async fn update_access_token(
        &self,
        user_id: &str,
        token: &AccessToken,
    ) -> Result<(), CredentialError> {
        (**self).update_access_token(user_id, token).await
    }
}

#[async_trait]
impl<T: TokenProvider + ?Sized> TokenProvider for Arc<T> {
    async fn refresh(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<AccessToken, CredentialError> {
        (**self).refresh(client, refresh_token).await
    }
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct CredentialResolver<S: CredentialStore, T: TokenProvider> {
    store: S,
    tokens: T,
    shared: Option<SharedCredentials>,
    /// Token minted from the service-wide refresh token.
    shared_token: RwLock<Option<AccessToken>>,
    /// Tokens minted through the shared app from a user's own consent, by user id.
    user_tokens: DashMap<String, AccessToken>,
}

impl<S: CredentialStore, T: TokenProvider> CredentialResolver<S, T> {
    pub fn new(store: S, tokens: T, shared: Option<SharedCredentials>) -> Self {
        Self {
            store,
            tokens,
            shared,
            shared_token: RwLock::new(None),
            user_tokens: DashMap::new(),
        }
    }

    /// Resolve the credentials a user's calls should run with.
    ///
    /// Configured personal credentials win; otherwise the shared app is used;
    /// with neither, `CredentialError::NotConfigured`.
    pub async fn resolve(&self, user_id: &str) -> Result<ResolvedCredentials, CredentialError> {
        let record = self.store.get(user_id).await?;

        if let Some(record) = record.as_ref() {
            if let Some(personal) = record.personal() {
                let access_token = match record.usable_access_token(Utc::now()) {
                    Some(token) => token.to_string(),
                    None => {
                        let fresh = self
                            .tokens
                            .refresh(&personal.oauth, &personal.refresh_token)
                            .await?;
                        self.store.update_access_token(user_id, &fresh).await?;
                        tracing::debug!(user_id, "refreshed personal Google Ads access token");
                        fresh.token
                    }
                };

                return Ok(ResolvedCredentials {
                    access_token,
                    developer_token: personal.developer_token,
                    customer_id: record.customer_id.clone(),
                    uses_own_credentials: true,
                });
            }
        }

        let Some(shared) = self.shared.as_ref() else {
            return Err(CredentialError::NotConfigured);
        };

        // A user who consented through the shared OAuth app carries their own
        // refresh token; everyone else borrows the service account's.
        let user_refresh_token = record
            .as_ref()
            .filter(|r| r.use_shared_credentials)
            .and_then(|r| r.refresh_token.as_deref())
            .filter(|t| !t.trim().is_empty());

        let access_token = match user_refresh_token {
            Some(refresh_token) => self.user_access_token(user_id, shared, refresh_token).await?,
            None => self.shared_access_token(shared).await?,
        };

        let customer_id = record
            .as_ref()
            .and_then(|r| r.customer_id.clone())
            .or_else(|| shared.default_customer_id.clone());

        Ok(ResolvedCredentials {
            access_token,
            developer_token: shared.developer_token.clone(),
            customer_id,
            uses_own_credentials: false,
        })
    }

    /// Shortcut for callers that only need the Google Ads headers.
    pub async fn resolve_auth(
        &self,
        user_id: &str,
    ) -> Result<(AdsAuth, ResolvedCredentials), CredentialError> {
        let resolved = self.resolve(user_id).await?;
        let auth = AdsAuth::new(resolved.access_token.clone(), resolved.developer_token.clone());
        Ok((auth, resolved))
    }

    async fn shared_access_token(
        &self,
        shared: &SharedCredentials,
    ) -> Result<String, CredentialError> {
        {
            let cached = self.shared_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(Utc::now()) {
                    return Ok(token.token.clone());
                }
            }
        }

        let fresh = self
            .tokens
            .refresh(&shared.oauth, &shared.refresh_token)
            .await?;
        tracing::debug!("refreshed shared Google Ads access token");

        let token = fresh.token.clone();
        *self.shared_token.write().await = Some(fresh);
        Ok(token)
    }

    async fn user_access_token(
        &self,
        user_id: &str,
        shared: &SharedCredentials,
        refresh_token: &str,
    ) -> Result<String, CredentialError> {
        let cached = self
            .user_tokens
            .get(user_id)
            .filter(|token| token.is_fresh(Utc::now()))
            .map(|token| token.token.clone());
        if let Some(token) = cached {
            return Ok(token);
        }

        let fresh = self.tokens.refresh(&shared.oauth, refresh_token).await?;
        tracing::debug!(user_id, "refreshed Google Ads access token from the user's consent");

        let token = fresh.token.clone();
        self.user_tokens.insert(user_id.to_string(), fresh);
        Ok(token)
    }

    /// Create or replace a user's credentials (setup and re-auth).
    pub async fn save_setup(
        &self,
        user_id: &str,
        setup: CredentialSetup,
    ) -> Result<CredentialStatus, CredentialError> {
        let record = UserCredentials {
            user_id: user_id.to_string(),
            use_shared_credentials: setup.use_shared_credentials,
            developer_token: setup.developer_token,
            client_id: setup.client_id,
            client_secret: setup.client_secret,
            refresh_token: setup.refresh_token,
            access_token: None,
            token_expires_at: None,
            customer_id: setup.customer_id,
            is_configured: true,
            updated_at: Utc::now(),
        };

        if !record.use_shared_credentials && record.personal().is_none() {
            return Err(CredentialError::Invalid(
                "developer token, client id, client secret and refresh token are all required"
                    .to_string(),
            ));
        }
        if record.use_shared_credentials && self.shared.is_none() {
            return Err(CredentialError::Invalid(
                "shared credentials are not available on this deployment".to_string(),
            ));
        }

        self.store.save(&record).await?;
        self.user_tokens.remove(user_id);
        tracing::info!(
            user_id,
            shared = record.use_shared_credentials,
            "saved Google Ads credentials"
        );

        Ok(self.status_for(Some(&record)))
    }

    pub async fn status(&self, user_id: &str) -> Result<CredentialStatus, CredentialError> {
        let record = self.store.get(user_id).await?;
        Ok(self.status_for(record.as_ref()))
    }

    fn status_for(&self, record: Option<&UserCredentials>) -> CredentialStatus {
        let uses_own_credentials = record.is_some_and(|r| r.personal().is_some());
        let customer_id = record
            .and_then(|r| r.customer_id.clone())
            .or_else(|| self.shared.as_ref().and_then(|s| s.default_customer_id.clone()));

        CredentialStatus {
            configured: uses_own_credentials || self.shared.is_some(),
            uses_own_credentials,
            shared_available: self.shared.is_some(),
            customer_id,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::InMemoryCredentialStore;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Hands out "<refresh_token>-<n>" and remembers which app asked.
    #[derive(Default)]
    struct CountingTokenProvider {
        calls: Mutex<Vec<(String, String)>>,
        reject: bool,
    }

    impl CountingTokenProvider {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TokenProvider for CountingTokenProvider {
        async fn refresh(
            &self,
            client: &OAuthClient,
            refresh_token: &str,
        ) -> Result<AccessToken, CredentialError> {
            if self.reject {
                return Err(CredentialError::ReauthRequired("invalid_grant".to_string()));
            }
            let mut calls = self.calls.lock().unwrap();
            calls.push((client.client_id.clone(), refresh_token.to_string()));
            Ok(AccessToken {
                token: format!("{}-{}", refresh_token, calls.len()),
                expires_at: Utc::now() + Duration::hours(1),
            })
        }
    }

    fn shared() -> SharedCredentials {
        SharedCredentials {
            developer_token: "shared-dev".to_string(),
            oauth: OAuthClient {
                client_id: "shared-app".to_string(),
                client_secret: "shared-secret".to_string(),
            },
            refresh_token: "shared-refresh".to_string(),
            default_customer_id: Some("1000".to_string()),
        }
    }

    fn personal(user_id: &str) -> UserCredentials {
        UserCredentials {
            user_id: user_id.to_string(),
            use_shared_credentials: false,
            developer_token: Some("own-dev".to_string()),
            client_id: Some("own-app".to_string()),
            client_secret: Some("own-secret".to_string()),
            refresh_token: Some("own-refresh".to_string()),
            access_token: None,
            token_expires_at: None,
            customer_id: Some("2000".to_string()),
            is_configured: true,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn nothing_configured_is_an_explicit_signal() {
        let resolver = CredentialResolver::new(
            InMemoryCredentialStore::new(),
            CountingTokenProvider::default(),
            None,
        );

        let err = resolver.resolve("nobody").await.unwrap_err();
        assert!(matches!(err, CredentialError::NotConfigured));
    }

    #[tokio::test]
    async fn configured_personal_credentials_win_over_shared() {
        let store = InMemoryCredentialStore::new();
        store.save(&personal("u1")).await.unwrap();
        let resolver =
            CredentialResolver::new(store, CountingTokenProvider::default(), Some(shared()));

        let resolved = resolver.resolve("u1").await.unwrap();

        assert!(resolved.uses_own_credentials);
        assert_eq!(resolved.developer_token, "own-dev");
        assert_eq!(resolved.access_token, "own-refresh-1");
        assert_eq!(resolved.customer_id.as_deref(), Some("2000"));
    }

    #[tokio::test]
    async fn refreshed_personal_token_is_persisted_and_reused() {
        let store = InMemoryCredentialStore::new();
        store.save(&personal("u1")).await.unwrap();
        let resolver = CredentialResolver::new(store, CountingTokenProvider::default(), None);

        let first = resolver.resolve("u1").await.unwrap();
        let second = resolver.resolve("u1").await.unwrap();

        assert_eq!(first.access_token, second.access_token);
        assert_eq!(resolver.tokens.calls().len(), 1);
        let stored = resolver.store.get("u1").await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("own-refresh-1"));
    }

    #[tokio::test]
    async fn incomplete_personal_setup_falls_back_to_shared() {
        let store = InMemoryCredentialStore::new();
        let mut record = personal("u1");
        record.developer_token = None;
        store.save(&record).await.unwrap();
        let resolver =
            CredentialResolver::new(store, CountingTokenProvider::default(), Some(shared()));

        let resolved = resolver.resolve("u1").await.unwrap();

        assert!(!resolved.uses_own_credentials);
        assert_eq!(resolved.developer_token, "shared-dev");
        // The user's own customer id still applies.
        assert_eq!(resolved.customer_id.as_deref(), Some("2000"));
    }

    #[tokio::test]
    async fn shared_token_is_cached_between_users() {
        let resolver = CredentialResolver::new(
            InMemoryCredentialStore::new(),
            CountingTokenProvider::default(),
            Some(shared()),
        );

        let a = resolver.resolve("a").await.unwrap();
        let b = resolver.resolve("b").await.unwrap();

        assert_eq!(a.access_token, b.access_token);
        assert_eq!(a.customer_id.as_deref(), Some("1000"));
        assert_eq!(
            resolver.tokens.calls(),
            vec![("shared-app".to_string(), "shared-refresh".to_string())]
        );
    }

    #[tokio::test]
    async fn shared_mode_prefers_the_users_own_consent() {
        let store = InMemoryCredentialStore::new();
        let mut record = personal("u1");
        record.use_shared_credentials = true;
        record.refresh_token = Some("user-consent".to_string());
        store.save(&record).await.unwrap();
        let resolver =
            CredentialResolver::new(store, CountingTokenProvider::default(), Some(shared()));

        let resolved = resolver.resolve("u1").await.unwrap();

        assert!(!resolved.uses_own_credentials);
        assert_eq!(
            resolver.tokens.calls(),
            vec![("shared-app".to_string(), "user-consent".to_string())]
        );
    }

    #[tokio::test]
    async fn shared_mode_reuses_the_users_token_until_setup_changes() {
        let store = InMemoryCredentialStore::new();
        let mut record = personal("u1");
        record.use_shared_credentials = true;
        record.refresh_token = Some("user-consent".to_string());
        store.save(&record).await.unwrap();
        let resolver =
            CredentialResolver::new(store, CountingTokenProvider::default(), Some(shared()));

        let first = resolver.resolve("u1").await.unwrap();
        let second = resolver.resolve("u1").await.unwrap();
        assert_eq!(first.access_token, "user-consent-1");
        assert_eq!(second.access_token, "user-consent-1");
        assert_eq!(resolver.tokens.calls().len(), 1);

        let setup = CredentialSetup {
            use_shared_credentials: true,
            refresh_token: Some("new-consent".to_string()),
            ..Default::default()
        };
        resolver.save_setup("u1", setup).await.unwrap();
        let after = resolver.resolve("u1").await.unwrap();

        assert_eq!(after.access_token, "new-consent-2");
        assert_eq!(resolver.tokens.calls().len(), 2);
    }

    #[tokio::test]
    async fn revoked_refresh_token_asks_for_reauth() {
        let store = InMemoryCredentialStore::new();
        store.save(&personal("u1")).await.unwrap();
        let tokens = CountingTokenProvider {
            reject: true,
            ..Default::default()
        };
        let resolver = CredentialResolver::new(store, tokens, None);

        let err = resolver.resolve("u1").await.unwrap_err();
        assert!(matches!(err, CredentialError::ReauthRequired(_)));
    }

    #[tokio::test]
    async fn setup_rejects_partial_personal_credentials() {
        let resolver = CredentialResolver::new(
            InMemoryCredentialStore::new(),
            CountingTokenProvider::default(),
            None,
        );
        let setup = CredentialSetup {
            developer_token: Some("dev".to_string()),
            ..Default::default()
        };

        let err = resolver.save_setup("u1", setup).await.unwrap_err();
        assert!(matches!(err, CredentialError::Invalid(_)));
        assert!(resolver.store.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn setup_then_status_reports_own_credentials() {
        let resolver = CredentialResolver::new(
            InMemoryCredentialStore::new(),
            CountingTokenProvider::default(),
            Some(shared()),
        );
        let setup = CredentialSetup {
            use_shared_credentials: false,
            developer_token: Some("dev".to_string()),
            client_id: Some("cid".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            customer_id: Some("555".to_string()),
        };

        resolver.save_setup("u1", setup).await.unwrap();
        let status = resolver.status("u1").await.unwrap();

        assert!(status.configured);
        assert!(status.uses_own_credentials);
        assert!(status.shared_available);
        assert_eq!(status.customer_id.as_deref(), Some("555"));
    }
}
