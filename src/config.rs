// Runtime configuration, read once at startup from the environment (and `.env`).

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::core::credentials::{OAuthClient, SharedCredentials};
use crate::infra::ai::OPENAI_BASE_URL;
use crate::infra::google_ads::GOOGLE_TOKEN_URL;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ads.db";
pub const DEFAULT_ADS_API_BASE_URL: &str = "https://googleads.googleapis.com";
pub const DEFAULT_ADS_API_VERSION: &str = "v17";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing env: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("expected `sqlite` or `memory`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub database_url: String,
    pub session_jwt_secret: String,
    pub ads_api_base_url: String,
    pub ads_api_version: String,
    pub oauth_token_url: String,
    /// Write manager/client pairs found by probing back to the hierarchy table.
    pub persist_hierarchy: bool,
    /// Set only when the deployment provides a complete shared Google Ads app.
    pub shared_credentials: Option<SharedCredentials>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let bind_addr = or_default("BIND_ADDR", DEFAULT_BIND_ADDR)
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: err.to_string(),
            })?;

        let storage = match get("STORAGE_BACKEND") {
            Some(value) => value
                .parse::<StorageBackend>()
                .map_err(|reason| ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    reason,
                })?,
            None => StorageBackend::Sqlite,
        };

        let persist_hierarchy = match get("MCC_PERSIST_HIERARCHY") {
            Some(value) => value.parse::<bool>().map_err(|err| ConfigError::Invalid {
                name: "MCC_PERSIST_HIERARCHY",
                reason: err.to_string(),
            })?,
            None => true,
        };

        let session_jwt_secret =
            get("SESSION_JWT_SECRET").ok_or(ConfigError::Missing("SESSION_JWT_SECRET"))?;

        let shared_credentials = match (
            get("GOOGLE_ADS_DEVELOPER_TOKEN"),
            get("GOOGLE_ADS_CLIENT_ID"),
            get("GOOGLE_ADS_CLIENT_SECRET"),
            get("GOOGLE_ADS_REFRESH_TOKEN"),
        ) {
            (Some(developer_token), Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(SharedCredentials {
                    developer_token,
                    oauth: OAuthClient {
                        client_id,
                        client_secret,
                    },
                    refresh_token,
                    default_customer_id: get("GOOGLE_ADS_DEFAULT_CUSTOMER_ID"),
                })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            storage,
            database_url: or_default("DATABASE_URL", DEFAULT_DATABASE_URL),
            session_jwt_secret,
            ads_api_base_url: or_default("GOOGLE_ADS_API_BASE_URL", DEFAULT_ADS_API_BASE_URL),
            ads_api_version: or_default("GOOGLE_ADS_API_VERSION", DEFAULT_ADS_API_VERSION),
            oauth_token_url: or_default("GOOGLE_OAUTH_TOKEN_URL", GOOGLE_TOKEN_URL),
            persist_hierarchy,
            shared_credentials,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            openai_base_url: or_default("OPENAI_BASE_URL", OPENAI_BASE_URL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = config_from(&[("SESSION_JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.ads_api_version, "v17");
        assert_eq!(config.oauth_token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert!(config.persist_hierarchy);
        assert!(config.shared_credentials.is_none());
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let err = config_from(&[("SESSION_JWT_SECRET", "   ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SESSION_JWT_SECRET"));
    }

    #[test]
    fn invalid_bind_addr_and_backend_are_rejected() {
        let err = config_from(&[("SESSION_JWT_SECRET", "s"), ("BIND_ADDR", "not-a-socket")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BIND_ADDR", .. }));

        let err = config_from(&[("SESSION_JWT_SECRET", "s"), ("STORAGE_BACKEND", "postgres")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORAGE_BACKEND", .. }));

        let err = config_from(&[("SESSION_JWT_SECRET", "s"), ("MCC_PERSIST_HIERARCHY", "maybe")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MCC_PERSIST_HIERARCHY", .. }));
    }

    #[test]
    fn shared_credentials_need_all_four_values() {
        let partial = config_from(&[
            ("SESSION_JWT_SECRET", "s"),
            ("GOOGLE_ADS_DEVELOPER_TOKEN", "dev"),
            ("GOOGLE_ADS_CLIENT_ID", "cid"),
            ("GOOGLE_ADS_CLIENT_SECRET", "secret"),
        ])
        .unwrap();
        assert!(partial.shared_credentials.is_none());

        let full = config_from(&[
            ("SESSION_JWT_SECRET", "s"),
            ("STORAGE_BACKEND", "Memory"),
            ("GOOGLE_ADS_DEVELOPER_TOKEN", "dev"),
            ("GOOGLE_ADS_CLIENT_ID", "cid"),
            ("GOOGLE_ADS_CLIENT_SECRET", "secret"),
            ("GOOGLE_ADS_REFRESH_TOKEN", "refresh"),
            ("GOOGLE_ADS_DEFAULT_CUSTOMER_ID", "123-456-7890"),
        ])
        .unwrap();
        assert_eq!(full.storage, StorageBackend::Memory);
        let shared = full.shared_credentials.unwrap();
        assert_eq!(shared.developer_token, "dev");
        assert_eq!(shared.oauth.client_id, "cid");
        assert_eq!(shared.default_customer_id.as_deref(), Some("123-456-7890"));
    }
}
