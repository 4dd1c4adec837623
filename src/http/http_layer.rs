// HTTP layer - axum router, session auth and the JSON envelope.
// Handlers stay thin: extract, call core, wrap the result.

pub mod api_error;

pub mod app_state;

pub mod session_auth;

#[path = "routes/route_catalog.rs"]
pub mod routes;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;

pub use app_state::AppState;
pub use routes::router;

/// Serve the dashboard API until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Dashboard API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Dashboard API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============================================================================
// TESTS
// ============================================================================
// Full requests against a real listener, with the fake gateway and
// in-memory stores behind the router.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    use super::*;
    use crate::core::ai::AiProvider;
    use crate::core::credentials::{
        AccessToken, CredentialError, CredentialResolver, CredentialStore, OAuthClient,
        SharedCredentials, TokenProvider,
    };
    use crate::core::google_ads::fake_ads_api::{campaign, metrics, FakeAdsApi};
    use crate::core::google_ads::GoogleAdsApi;
    use crate::core::insights::InsightService;
    use crate::http::session_auth::sign_session_token;
    use crate::infra::storage::{InMemoryCredentialStore, InMemoryHierarchyStore};

    const SECRET: &str = "test-secret";

    struct StaticTokens;

    #[async_trait]
    impl TokenProvider for StaticTokens {
        async fn refresh(
            &self,
            _client: &OAuthClient,
            refresh_token: &str,
        ) -> Result<AccessToken, CredentialError> {
            Ok(AccessToken {
                token: format!("access-for-{}", refresh_token),
                expires_at: Utc::now() + Duration::hours(1),
            })
        }
    }

    fn shared(default_customer: Option<&str>) -> SharedCredentials {
        SharedCredentials {
            developer_token: "shared-dev".to_string(),
            oauth: OAuthClient {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
            },
            refresh_token: "service-refresh".to_string(),
            default_customer_id: default_customer.map(str::to_string),
        }
    }

    fn state_with(ads: FakeAdsApi, shared: Option<SharedCredentials>) -> (AppState, Arc<FakeAdsApi>) {
        let fake = Arc::new(ads);
        let gateway: Arc<dyn GoogleAdsApi> = fake.clone();
        let store: Box<dyn CredentialStore> = Box::new(InMemoryCredentialStore::new());
        let tokens: Arc<dyn TokenProvider> = Arc::new(StaticTokens);

        let state = AppState::new(
            CredentialResolver::new(store, tokens, shared),
            gateway,
            Box::new(InMemoryHierarchyStore::new()),
            true,
            InsightService::<Box<dyn AiProvider>>::new(None),
            SECRET,
        );
        (state, fake)
    }

    /// Client 2223334444 sits under manager 111, which the identity reaches directly.
    fn managed_account() -> FakeAdsApi {
        let mut ads = FakeAdsApi::new()
            .with_accessible(&["111"])
            .with_manager("2223334444", "111");
        ads.campaigns = vec![
            campaign("1", "Brand", metrics(10_000, 500, 50_000_000, 25.0)),
            campaign("2", "Generic", metrics(20_000, 150, 90_000_000, 0.0)),
        ];
        ads
    }

    async fn spawn(state: AppState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router(state)).await;
        });
        format!("http://{}", addr)
    }

    async fn post(base: &str, path: &str, token: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("{}{}", base, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn healthz_needs_no_session() {
        let (state, _) = state_with(FakeAdsApi::new(), None);
        let base = spawn(state).await;

        let response = reqwest::get(format!("{}/healthz", base)).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn missing_or_expired_session_is_rejected() {
        let (state, _) = state_with(managed_account(), Some(shared(None)));
        let base = spawn(state).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/campaigns", base))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let expired = sign_session_token("u1", SECRET, -3600);
        let (status, body) = post(&base, "/api/campaigns", &expired, json!({})).await;
        assert_eq!(status, 401);
        assert_eq!(body["code"], "SESSION_EXPIRED");
    }

    #[tokio::test]
    async fn unconfigured_user_gets_not_configured() {
        let (state, fake) = state_with(managed_account(), None);
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) =
            post(&base, "/api/campaigns", &token, json!({ "customerId": "2223334444" })).await;

        assert_eq!(status, 412);
        assert_eq!(body["code"], "NOT_CONFIGURED");
        assert_eq!(fake.probe_count(), 0);
    }

    #[tokio::test]
    async fn campaigns_are_read_through_the_resolved_manager() {
        let (state, fake) = state_with(managed_account(), Some(shared(None)));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) =
            post(&base, "/api/campaigns", &token, json!({ "customerId": "222-333-4444" })).await;

        assert_eq!(status, 200, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["customerId"], "2223334444");
        assert_eq!(body["data"]["loginCustomerId"], "111");
        assert_eq!(body["data"]["rows"].as_array().unwrap().len(), 2);

        // Second request is served from the memo.
        let probes = fake.probe_count();
        post(&base, "/api/campaigns", &token, json!({ "customerId": "2223334444" })).await;
        assert_eq!(fake.probe_count(), probes);
    }

    #[tokio::test]
    async fn missing_customer_id_is_a_bad_request() {
        let (state, _) = state_with(managed_account(), Some(shared(None)));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(&base, "/api/campaigns", &token, json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "MISSING_CUSTOMER_ID");
    }

    #[tokio::test]
    async fn saved_personal_credentials_show_up_in_status() {
        let (state, _) = state_with(FakeAdsApi::new(), None);
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);
        let client = reqwest::Client::new();

        let response = client
            .put(format!("{}/api/credentials", base))
            .bearer_auth(&token)
            .json(&json!({
                "developerToken": "dev",
                "clientId": "cid",
                "clientSecret": "secret",
                "refreshToken": "refresh",
                "customerId": "123-456-7890"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let body: Value = client
            .get(format!("{}/api/credentials", base))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["configured"], true);
        assert_eq!(body["data"]["usesOwnCredentials"], true);
        assert!(body["data"].get("clientSecret").is_none());
    }

    #[tokio::test]
    async fn optimization_batch_reports_each_action() {
        let mut ads = managed_account();
        ads.failing_campaigns = HashSet::from(["2".to_string()]);
        let (state, fake) = state_with(ads, Some(shared(Some("2223334444"))));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(
            &base,
            "/api/optimizations/apply",
            &token,
            json!({
                "actions": [
                    { "type": "PAUSE_CAMPAIGN", "campaignId": "1" },
                    { "type": "PAUSE_CAMPAIGN", "campaignId": "2" }
                ]
            }),
        )
        .await;

        assert_eq!(status, 200, "{body}");
        assert_eq!(body["data"]["succeeded"], 1);
        assert_eq!(body["data"]["failed"], 1);
        let results = body["data"]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["success"], true);
        assert_eq!(results[1]["success"], false);
        assert_eq!(fake.mutation_log(), vec!["status 1 PAUSED".to_string()]);
    }

    #[tokio::test]
    async fn invalid_budget_never_reaches_google_ads() {
        let (state, fake) = state_with(managed_account(), Some(shared(Some("2223334444"))));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(
            &base,
            "/api/campaigns/budget",
            &token,
            json!({ "budgetId": "b1", "amountMicros": 5_000_000 }),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let (status, _) = post(
            &base,
            "/api/campaigns/budget",
            &token,
            json!({ "budgetId": "77", "amountMicros": 10 }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(fake.mutation_log().is_empty());
    }

    #[tokio::test]
    async fn insights_fall_back_without_a_provider() {
        let (state, _) = state_with(managed_account(), Some(shared(Some("2223334444"))));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(&base, "/api/insights/campaigns", &token, json!({})).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["data"]["generatedByAi"], false);
        assert!(!body["data"]["recommendations"].as_array().unwrap().is_empty());

        let (status, body) = post(&base, "/api/insights/weather", &token, json!({})).await;
        assert_eq!(status, 404);
        assert_eq!(body["code"], "UNKNOWN_INSIGHT");
    }

    #[tokio::test]
    async fn rules_propose_actions_for_matching_campaigns() {
        let (state, _) = state_with(managed_account(), Some(shared(Some("2223334444"))));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(
            &base,
            "/api/rules/evaluate",
            &token,
            json!({
                "rules": [{
                    "name": "No conversions",
                    "metric": "conversions",
                    "comparator": "==",
                    "threshold": 0.0,
                    "action": { "type": "PAUSE_CAMPAIGN" }
                }]
            }),
        )
        .await;

        assert_eq!(status, 200, "{body}");
        let matches = body["data"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["campaignId"], "2");
        assert_eq!(matches[0]["proposedAction"]["type"], "PAUSE_CAMPAIGN");
    }

    #[tokio::test]
    async fn resolved_manager_pair_is_stored() {
        let (state, _) = state_with(managed_account(), Some(shared(None)));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(
            &base,
            "/api/mcc/resolve",
            &token,
            json!({ "customerId": "222-333-4444" }),
        )
        .await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["data"]["loginCustomerId"], "111");
        assert_eq!(body["data"]["accessPath"]["kind"], "viaManager");

        let body: Value = reqwest::Client::new()
            .get(format!("{}/api/mcc/hierarchy", base))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let records = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .any(|r| r["customerId"] == "111" && r["isManager"] == true));

        // Another user sees none of it.
        let other = sign_session_token("u2", SECRET, 3600);
        let body: Value = reqwest::Client::new()
            .get(format!("{}/api/mcc/hierarchy", base))
            .bearer_auth(&other)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn malformed_body_uses_the_error_envelope() {
        let (state, fake) = state_with(managed_account(), Some(shared(Some("2223334444"))));
        let base = spawn(state).await;
        let token = sign_session_token("u1", SECRET, 3600);

        let (status, body) = post(
            &base,
            "/api/optimizations/apply",
            &token,
            json!({
                "actions": [
                    { "type": "REDUCE_BUDGET", "campaignId": "1", "budgetId": "5", "percent": 300 }
                ]
            }),
        )
        .await;
        assert_eq!(status, 400, "{body}");
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_REQUEST");

        let response = reqwest::Client::new()
            .post(format!("{}/api/campaigns", base))
            .bearer_auth(&token)
            .header("content-type", "application/json")
            .body("{ not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        assert!(fake.mutation_log().is_empty());
    }
}
