use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored access tokens are reused only while they have this much life left.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Per-user Google Ads credentials as they sit in the store.
///
/// A record is in one of two modes:
/// - `use_shared_credentials = true`: the service-wide developer token and
///   OAuth app are used. `refresh_token` may still hold the user's own consent.
/// - otherwise: every personal field must be present and `is_configured` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub user_id: String,
    pub use_shared_credentials: bool,
    pub developer_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
    pub is_configured: bool,
    pub updated_at: DateTime<Utc>,
}

impl UserCredentials {
    /// Personal credentials, if this record is a complete personal setup.
    pub fn personal(&self) -> Option<PersonalCredentials> {
        if self.use_shared_credentials || !self.is_configured {
            return None;
        }

        Some(PersonalCredentials {
            developer_token: non_empty(self.developer_token.as_deref())?,
            oauth: OAuthClient {
                client_id: non_empty(self.client_id.as_deref())?,
                client_secret: non_empty(self.client_secret.as_deref())?,
            },
            refresh_token: non_empty(self.refresh_token.as_deref())?,
        })
    }

    /// The stored access token, if it won't expire within the safety margin.
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        let token = self.access_token.as_deref().filter(|t| !t.is_empty())?;
        let expires_at = self.token_expires_at?;
        (expires_at > now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS)).then_some(token)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// An OAuth app (client id + secret) used for the refresh-token grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalCredentials {
    pub developer_token: String,
    pub oauth: OAuthClient,
    pub refresh_token: String,
}

/// Service-wide credentials from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedCredentials {
    pub developer_token: String,
    pub oauth: OAuthClient,
    pub refresh_token: String,
    pub default_customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS)
    }
}

/// What every Google Ads call needs, resolved for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCredentials {
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub developer_token: String,
    pub customer_id: Option<String>,
    pub uses_own_credentials: bool,
}

/// Setup / re-auth payload coming from the UI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSetup {
    #[serde(default)]
    pub use_shared_credentials: bool,
    pub developer_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub customer_id: Option<String>,
}

/// Secret-free view of a user's setup for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub configured: bool,
    pub uses_own_credentials: bool,
    pub shared_available: bool,
    pub customer_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal_record() -> UserCredentials {
        UserCredentials {
            user_id: "u1".to_string(),
            use_shared_credentials: false,
            developer_token: Some("dev".to_string()),
            client_id: Some("cid".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            access_token: None,
            token_expires_at: None,
            customer_id: Some("123".to_string()),
            is_configured: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn personal_requires_every_field() {
        assert!(personal_record().personal().is_some());

        let mut missing = personal_record();
        missing.client_secret = Some("  ".to_string());
        assert!(missing.personal().is_none());

        let mut unconfigured = personal_record();
        unconfigured.is_configured = false;
        assert!(unconfigured.personal().is_none());

        let mut shared = personal_record();
        shared.use_shared_credentials = true;
        assert!(shared.personal().is_none());
    }

    #[test]
    fn access_token_near_expiry_is_not_reused() {
        let now = Utc::now();
        let mut record = personal_record();
        record.access_token = Some("tok".to_string());

        record.token_expires_at = Some(now + Duration::seconds(30));
        assert_eq!(record.usable_access_token(now), None);

        record.token_expires_at = Some(now + Duration::minutes(30));
        assert_eq!(record.usable_access_token(now), Some("tok"));
    }
}
