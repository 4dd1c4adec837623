// Google Ads REST client.
//
// Thin wrappers over `customers:listAccessibleCustomers`, `googleAds:search`
// and the `*:mutate` endpoints. Every call sends the OAuth bearer token and the
// developer token; `login-customer-id` is added only when the auth carries one.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use super::gaql_rows;
use crate::core::google_ads::{
    AdGroupSnapshot, AdSnapshot, AdsAuth, AdsError, CampaignSnapshot, CampaignStatus,
    ClientAccount, CreatedCampaign, CustomerInfo, DateRange, GoogleAdsApi, KeywordMatchType,
    KeywordSnapshot, NewCampaign, SearchTermSnapshot,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound on `nextPageToken` follow-ups for one search.
const MAX_SEARCH_PAGES: usize = 20;

pub struct GoogleAdsClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl GoogleAdsClient {
    pub fn new(base_url: &str, api_version: &str) -> Result<Self, AdsError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    fn authorized(&self, builder: RequestBuilder, auth: &AdsAuth) -> RequestBuilder {
        let builder = builder
            .bearer_auth(&auth.access_token)
            .header("developer-token", &auth.developer_token);
        match auth.login_customer_id.as_deref() {
            Some(login) => builder.header("login-customer-id", login),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, AdsError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| AdsError::InvalidResponse(e.to_string()))
    }

    /// Run a GAQL query and collect every row across pages.
    pub async fn search(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        query: &str,
    ) -> Result<Vec<Value>, AdsError> {
        let url = self.url(&format!("customers/{}/googleAds:search", customer_id));
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..MAX_SEARCH_PAGES {
            let mut body = json!({ "query": query });
            if let Some(token) = page_token.as_deref() {
                body["pageToken"] = json!(token);
            }

            let response = self
                .send(self.authorized(self.client.post(&url), auth).json(&body))
                .await?;

            if let Some(results) = response.get("results").and_then(Value::as_array) {
                rows.extend(results.iter().cloned());
            }

            page_token = response
                .get("nextPageToken")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            if page_token.is_none() {
                break;
            }
            if page + 1 == MAX_SEARCH_PAGES {
                tracing::warn!(customer_id, rows = rows.len(), "Search truncated at page limit");
            }
        }

        Ok(rows)
    }

    /// POST `operations` to `customers/{id}/{resource}:mutate` and return the
    /// resource names of the results.
    async fn mutate(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        resource: &str,
        operations: Vec<Value>,
    ) -> Result<Vec<String>, AdsError> {
        let url = self.url(&format!("customers/{}/{}:mutate", customer_id, resource));
        let response = self
            .send(
                self.authorized(self.client.post(&url), auth)
                    .json(&json!({ "operations": operations })),
            )
            .await?;

        let names: Vec<String> = response
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| gaql_rows::string_at(r, "/resourceName"))
                    .collect()
            })
            .unwrap_or_default();

        if names.is_empty() {
            return Err(AdsError::InvalidResponse(format!(
                "{} mutate returned no results",
                resource
            )));
        }
        Ok(names)
    }

    async fn mutate_one(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        resource: &str,
        operation: Value,
    ) -> Result<String, AdsError> {
        let mut names = self
            .mutate(auth, customer_id, resource, vec![operation])
            .await?;
        Ok(names.swap_remove(0))
    }

    fn map_rows<T>(
        rows: Vec<Value>,
        map: impl Fn(&Value) -> Result<T, AdsError>,
    ) -> Result<Vec<T>, AdsError> {
        rows.iter().map(map).collect()
    }
}

/// Turn a non-2xx response into the matching `AdsError`.
///
/// Google wraps errors as `{"error": {"code", "message", "status"}}`.
fn error_from_response(status: StatusCode, body: &str) -> AdsError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| gaql_rows::string_at(v, "/error/message"))
        .unwrap_or_else(|| body.chars().take(500).collect());
    let api_status = parsed
        .as_ref()
        .and_then(|v| gaql_rows::string_at(v, "/error/status"));

    if status == StatusCode::FORBIDDEN || api_status.as_deref() == Some("PERMISSION_DENIED") {
        return AdsError::PermissionDenied(message);
    }
    match status {
        StatusCode::UNAUTHORIZED => AdsError::Unauthenticated(message),
        StatusCode::NOT_FOUND => AdsError::NotFound(message),
        _ => AdsError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl GoogleAdsApi for GoogleAdsClient {
    async fn list_accessible_customers(&self, auth: &AdsAuth) -> Result<Vec<String>, AdsError> {
        // This endpoint ignores login-customer-id; send the bare identity.
        let auth = auth.acting_as(None);
        let url = self.url("customers:listAccessibleCustomers");
        let response = self.send(self.authorized(self.client.get(&url), &auth)).await?;

        let ids = response
            .get("resourceNames")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|name| name.trim_start_matches("customers/").to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    async fn probe_customer(&self, auth: &AdsAuth, customer_id: &str) -> Result<(), AdsError> {
        self.search(auth, customer_id, gaql_rows::PROBE_QUERY)
            .await
            .map(|_| ())
    }

    async fn get_customer_info(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<CustomerInfo, AdsError> {
        let rows = self
            .search(auth, customer_id, gaql_rows::CUSTOMER_INFO_QUERY)
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| AdsError::NotFound(format!("customer {}", customer_id)))?;
        gaql_rows::customer_info(row)
    }

    async fn list_client_accounts(
        &self,
        auth: &AdsAuth,
        manager_id: &str,
    ) -> Result<Vec<ClientAccount>, AdsError> {
        let rows = self
            .search(auth, manager_id, gaql_rows::CLIENT_ACCOUNTS_QUERY)
            .await?;
        Self::map_rows(rows, gaql_rows::client_account)
    }

    async fn fetch_campaigns(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        date_range: DateRange,
        campaign_ids: &[String],
    ) -> Result<Vec<CampaignSnapshot>, AdsError> {
        let query = gaql_rows::campaigns_query(date_range, campaign_ids)?;
        let rows = self.search(auth, customer_id, &query).await?;
        Self::map_rows(rows, gaql_rows::campaign)
    }

    async fn fetch_ad_groups(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdGroupSnapshot>, AdsError> {
        let query = gaql_rows::ad_groups_query(campaign_ids)?;
        let rows = self.search(auth, customer_id, &query).await?;
        Self::map_rows(rows, gaql_rows::ad_group)
    }

    async fn fetch_ads(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdSnapshot>, AdsError> {
        let query = gaql_rows::ads_query(campaign_ids)?;
        let rows = self.search(auth, customer_id, &query).await?;
        Self::map_rows(rows, gaql_rows::ad)
    }

    async fn fetch_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<KeywordSnapshot>, AdsError> {
        let query = gaql_rows::keywords_query(date_range, campaign_ids)?;
        let rows = self.search(auth, customer_id, &query).await?;
        Self::map_rows(rows, gaql_rows::keyword)
    }

    async fn fetch_search_terms(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<SearchTermSnapshot>, AdsError> {
        let query = gaql_rows::search_terms_query(date_range, campaign_ids)?;
        let rows = self.search(auth, customer_id, &query).await?;
        Self::map_rows(rows, gaql_rows::search_term)
    }

    async fn set_campaign_status(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<String, AdsError> {
        let operation = json!({
            "update": {
                "resourceName": format!("customers/{}/campaigns/{}", customer_id, campaign_id),
                "status": status.as_api_str(),
            },
            "updateMask": "status",
        });
        self.mutate_one(auth, customer_id, "campaigns", operation)
            .await
    }

    async fn update_campaign_budget(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        budget_id: &str,
        amount_micros: i64,
    ) -> Result<String, AdsError> {
        let operation = json!({
            "update": {
                "resourceName": format!("customers/{}/campaignBudgets/{}", customer_id, budget_id),
                "amountMicros": amount_micros.to_string(),
            },
            "updateMask": "amount_micros",
        });
        self.mutate_one(auth, customer_id, "campaignBudgets", operation)
            .await
    }

    async fn add_negative_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        keywords: &[String],
        match_type: KeywordMatchType,
    ) -> Result<Vec<String>, AdsError> {
        if keywords.is_empty() {
            return Err(AdsError::InvalidRequest("no keywords given".to_string()));
        }

        let campaign = format!("customers/{}/campaigns/{}", customer_id, campaign_id);
        let operations = keywords
            .iter()
            .map(|text| {
                json!({
                    "create": {
                        "campaign": campaign,
                        "negative": true,
                        "keyword": { "text": text, "matchType": match_type.as_api_str() },
                    }
                })
            })
            .collect();

        self.mutate(auth, customer_id, "campaignCriteria", operations)
            .await
    }

    async fn update_keyword_bid(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        ad_group_id: &str,
        criterion_id: &str,
        cpc_bid_micros: i64,
    ) -> Result<String, AdsError> {
        let operation = json!({
            "update": {
                "resourceName": format!(
                    "customers/{}/adGroupCriteria/{}~{}",
                    customer_id, ad_group_id, criterion_id
                ),
                "cpcBidMicros": cpc_bid_micros.to_string(),
            },
            "updateMask": "cpc_bid_micros",
        });
        self.mutate_one(auth, customer_id, "adGroupCriteria", operation)
            .await
    }

    async fn create_campaign(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign: &NewCampaign,
    ) -> Result<CreatedCampaign, AdsError> {
        campaign.validate()?;

        let budget_operation = json!({
            "create": {
                "name": format!("{} Budget", campaign.name),
                "amountMicros": campaign.daily_budget_micros.to_string(),
                "deliveryMethod": "STANDARD",
                "explicitlyShared": false,
            }
        });
        let budget_resource_name = self
            .mutate_one(auth, customer_id, "campaignBudgets", budget_operation)
            .await?;

        let campaign_operation = json!({
            "create": {
                "name": campaign.name,
                "status": campaign.status.as_api_str(),
                "advertisingChannelType": campaign.channel_type,
                "campaignBudget": budget_resource_name,
                "manualCpc": {},
                "networkSettings": {
                    "targetGoogleSearch": true,
                    "targetSearchNetwork": campaign.target_search_network,
                    "targetContentNetwork": false,
                },
            }
        });
        let campaign_resource_name = self
            .mutate_one(auth, customer_id, "campaigns", campaign_operation)
            .await?;

        tracing::info!(
            customer_id,
            campaign = campaign_resource_name.as_str(),
            "Created campaign"
        );
        Ok(CreatedCampaign {
            budget_resource_name,
            campaign_resource_name,
        })
    }
}
