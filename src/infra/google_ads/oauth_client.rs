use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::core::credentials::{AccessToken, CredentialError, OAuthClient, TokenProvider};

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Refresh-token grant against Google's OAuth2 endpoint.
pub struct GoogleOAuthClient {
    client: Client,
    token_url: String,
}

impl GoogleOAuthClient {
    pub fn new(token_url: &str) -> Result<Self, CredentialError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|e| CredentialError::OAuth(e.to_string()))?;
        Ok(Self {
            client,
            token_url: token_url.to_string(),
        })
    }
}

#[async_trait]
impl TokenProvider for GoogleOAuthClient {
    async fn refresh(
        &self,
        client: &OAuthClient,
        refresh_token: &str,
    ) -> Result<AccessToken, CredentialError> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::OAuth(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CredentialError::OAuth(e.to_string()))?;

        if !status.is_success() {
            // invalid_grant means the refresh token was revoked or expired.
            if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&text) {
                let detail = err.error_description.unwrap_or_else(|| err.error.clone());
                if err.error == "invalid_grant" {
                    tracing::warn!("Refresh token rejected: {}", detail);
                    return Err(CredentialError::ReauthRequired(detail));
                }
                return Err(CredentialError::OAuth(format!("{} ({})", detail, status)));
            }
            return Err(CredentialError::OAuth(format!(
                "token exchange failed ({}): {}",
                status, text
            )));
        }

        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| CredentialError::OAuth(e.to_string()))?;

        Ok(AccessToken {
            token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}
