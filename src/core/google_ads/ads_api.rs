use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::ads_models::{
    AdGroupSnapshot, AdSnapshot, AdsAuth, CampaignSnapshot, CampaignStatus, ClientAccount,
    CreatedCampaign, CustomerInfo, DateRange, KeywordMatchType, KeywordSnapshot, NewCampaign,
    SearchTermSnapshot,
};

/// Everything that can go wrong talking to Google Ads.
#[derive(Debug, Error)]
pub enum AdsError {
    #[error("Invalid customer id: {0}")]
    InvalidCustomerId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The identity can't act on this customer with the given login-customer-id.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Access token rejected: {0}")]
    Unauthenticated(String),

    #[error("Google Ads API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request to Google Ads failed: {0}")]
    Transport(String),

    #[error("Unexpected Google Ads response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

// ============================================================================
// GATEWAY TRAIT (PORT)
// ============================================================================
// One method per Google Ads call the dashboard makes. The REST client in
// infra implements it; tests use an in-process fake.
//
// `customer_id` arguments are already normalized (digits only).
// Empty `campaign_ids` slices mean "all campaigns".

#[async_trait]
pub trait GoogleAdsApi: Send + Sync {
    /// Customer ids the OAuth identity can reach without a login-customer-id.
    async fn list_accessible_customers(&self, auth: &AdsAuth) -> Result<Vec<String>, AdsError>;

    /// Cheapest possible query against `customer_id`. `Ok(())` means the
    /// headers in `auth` give access.
    async fn probe_customer(&self, auth: &AdsAuth, customer_id: &str) -> Result<(), AdsError>;

    async fn get_customer_info(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<CustomerInfo, AdsError>;

    /// Direct (level 1) clients of a manager account.
    async fn list_client_accounts(
        &self,
        auth: &AdsAuth,
        manager_id: &str,
    ) -> Result<Vec<ClientAccount>, AdsError>;

    async fn fetch_campaigns(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        date_range: DateRange,
        campaign_ids: &[String],
    ) -> Result<Vec<CampaignSnapshot>, AdsError>;

    async fn fetch_ad_groups(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdGroupSnapshot>, AdsError>;

    async fn fetch_ads(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdSnapshot>, AdsError>;

    async fn fetch_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<KeywordSnapshot>, AdsError>;

    async fn fetch_search_terms(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<SearchTermSnapshot>, AdsError>;

    /// Returns the mutated campaign's resource name.
    async fn set_campaign_status(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<String, AdsError>;

    async fn update_campaign_budget(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        budget_id: &str,
        amount_micros: i64,
    ) -> Result<String, AdsError>;

    /// Adds campaign-level negative keywords. Returns one resource name per keyword.
    async fn add_negative_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        keywords: &[String],
        match_type: KeywordMatchType,
    ) -> Result<Vec<String>, AdsError>;

    async fn update_keyword_bid(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        ad_group_id: &str,
        criterion_id: &str,
        cpc_bid_micros: i64,
    ) -> Result<String, AdsError>;

    async fn create_campaign(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign: &NewCampaign,
    ) -> Result<CreatedCampaign, AdsError>;
}

// Shared handle so the resolver, the executor and the HTTP handlers can all
// hold the same client.
#[async_trait]
impl<T: GoogleAdsApi + ?Sized> GoogleAdsApi for Arc<T> {
    async fn list_accessible_customers(&self, auth: &AdsAuth) -> Result<Vec<String>, AdsError> {
        (**self).list_accessible_customers(auth).await
    }

    async fn probe_customer(&self, auth: &AdsAuth, customer_id: &str) -> Result<(), AdsError> {
        (**self).probe_customer(auth, customer_id).await
    }

    async fn get_customer_info(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<CustomerInfo, AdsError> {
        (**self).get_customer_info(auth, customer_id).await
    }

    async fn list_client_accounts(
        &self,
        auth: &AdsAuth,
        manager_id: &str,
    ) -> Result<Vec<ClientAccount>, AdsError> {
        (**self).list_client_accounts(auth, manager_id).await
    }

    async fn fetch_campaigns(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        date_range: DateRange,
        campaign_ids: &[String],
    ) -> Result<Vec<CampaignSnapshot>, AdsError> {
        (**self)
            .fetch_campaigns(auth, customer_id, date_range, campaign_ids)
            .await
    }

    async fn fetch_ad_groups(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdGroupSnapshot>, AdsError> {
        (**self).fetch_ad_groups(auth, customer_id, campaign_ids).await
    }

    async fn fetch_ads(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdSnapshot>, AdsError> {
        (**self).fetch_ads(auth, customer_id, campaign_ids).await
    }

    async fn fetch_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<KeywordSnapshot>, AdsError> {
        (**self)
            .fetch_keywords(auth, customer_id, campaign_ids, date_range)
            .await
    }

    async fn fetch_search_terms(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        date_range: DateRange,
    ) -> Result<Vec<SearchTermSnapshot>, AdsError> {
        (**self)
            .fetch_search_terms(auth, customer_id, campaign_ids, date_range)
            .await
    }

    async fn set_campaign_status(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<String, AdsError> {
        (**self)
            .set_campaign_status(auth, customer_id, campaign_id, status)
            .await
    }

    async fn update_campaign_budget(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        budget_id: &str,
        amount_micros: i64,
    ) -> Result<String, AdsError> {
        (**self)
            .update_campaign_budget(auth, customer_id, budget_id, amount_micros)
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
        (**self)
            .add_negative_keywords(auth, customer_id, campaign_id, keywords, match_type)
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
        (**self)
            .update_keyword_bid(auth, customer_id, ad_group_id, criterion_id, cpc_bid_micros)
            .await
    }

    async fn create_campaign(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign: &NewCampaign,
    ) -> Result<CreatedCampaign, AdsError> {
        (**self).create_campaign(auth, customer_id, campaign).await
    }
}
