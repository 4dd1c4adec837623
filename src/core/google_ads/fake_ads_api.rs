// In-process stand-in for Google Ads, shared by the core and HTTP tests.
// Access rules are modeled the way the real API behaves: a call without a
// login-customer-id only works for directly accessible customers, and a call
// through a manager only works if that manager actually manages the customer.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ads_api::{AdsError, GoogleAdsApi};
use super::ads_models::{
    AdGroupSnapshot, AdSnapshot, AdsAuth, CampaignSnapshot, CampaignStatus, ClientAccount,
    CreatedCampaign, CustomerInfo, DateRange, KeywordMatchType, KeywordSnapshot, Metrics,
    NewCampaign, SearchTermSnapshot,
};

#[derive(Default)]
pub struct FakeAdsApi {
    pub accessible: Vec<String>,
    /// customer -> managers that can act on it
    pub managed_by: HashMap<String, Vec<String>>,
    pub infos: HashMap<String, CustomerInfo>,
    pub clients: HashMap<String, Vec<ClientAccount>>,
    pub campaigns: Vec<CampaignSnapshot>,
    pub ad_groups: Vec<AdGroupSnapshot>,
    pub ads: Vec<AdSnapshot>,
    pub keywords: Vec<KeywordSnapshot>,
    pub search_terms: Vec<SearchTermSnapshot>,
    /// Campaign ids whose mutations fail.
    pub failing_campaigns: HashSet<String>,
    pub probes: Mutex<Vec<(String, Option<String>)>>,
    pub mutations: Mutex<Vec<String>>,
}

impl FakeAdsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accessible(mut self, ids: &[&str]) -> Self {
        self.accessible = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn with_manager(mut self, client: &str, manager: &str) -> Self {
        self.managed_by
            .entry(client.to_string())
            .or_default()
            .push(manager.to_string());
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn mutation_log(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    fn check_access(&self, auth: &AdsAuth, customer_id: &str) -> Result<(), AdsError> {
        let allowed = match auth.login_customer_id.as_deref() {
            None => self.accessible.iter().any(|id| id == customer_id),
            Some(login) if login == customer_id => self.accessible.iter().any(|id| id == login),
            Some(login) => self
                .managed_by
                .get(customer_id)
                .is_some_and(|managers| managers.iter().any(|m| m == login)),
        };

        if allowed {
            Ok(())
        } else {
            Err(AdsError::PermissionDenied(format!(
                "customer {} not reachable via {:?}",
                customer_id, auth.login_customer_id
            )))
        }
    }

    fn record(&self, entry: String) {
        self.mutations.lock().unwrap().push(entry);
    }

    fn fail_if_flagged(&self, campaign_id: &str) -> Result<(), AdsError> {
        if self.failing_campaigns.contains(campaign_id) {
            return Err(AdsError::Api {
                status: 400,
                message: format!("mutation rejected for campaign {}", campaign_id),
            });
        }
        Ok(())
    }
}

fn matches_filter(campaign_id: &str, campaign_ids: &[String]) -> bool {
    campaign_ids.is_empty() || campaign_ids.iter().any(|id| id == campaign_id)
}

pub fn campaign(id: &str, name: &str, metrics: Metrics) -> CampaignSnapshot {
    CampaignSnapshot {
        id: id.to_string(),
        name: name.to_string(),
        status: "ENABLED".to_string(),
        channel_type: Some("SEARCH".to_string()),
        budget_id: Some(format!("9{}", id)),
        budget_amount_micros: Some(10_000_000),
        metrics,
    }
}

pub fn metrics(impressions: i64, clicks: i64, cost_micros: i64, conversions: f64) -> Metrics {
    Metrics {
        impressions,
        clicks,
        cost_micros,
        conversions,
        conversions_value: 0.0,
    }
}

#[async_trait]
impl GoogleAdsApi for FakeAdsApi {
    async fn list_accessible_customers(&self, _auth: &AdsAuth) -> Result<Vec<String>, AdsError> {
        Ok(self.accessible.clone())
    }

    async fn probe_customer(&self, auth: &AdsAuth, customer_id: &str) -> Result<(), AdsError> {
        self.probes
            .lock()
            .unwrap()
            .push((customer_id.to_string(), auth.login_customer_id.clone()));
        self.check_access(auth, customer_id)
    }

    async fn get_customer_info(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
    ) -> Result<CustomerInfo, AdsError> {
        self.check_access(auth, customer_id)?;
        self.infos
            .get(customer_id)
            .cloned()
            .ok_or_else(|| AdsError::NotFound(customer_id.to_string()))
    }

    async fn list_client_accounts(
        &self,
        auth: &AdsAuth,
        manager_id: &str,
    ) -> Result<Vec<ClientAccount>, AdsError> {
        self.check_access(auth, manager_id)?;
        Ok(self.clients.get(manager_id).cloned().unwrap_or_default())
    }

    async fn fetch_campaigns(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        _date_range: DateRange,
        campaign_ids: &[String],
    ) -> Result<Vec<CampaignSnapshot>, AdsError> {
        self.check_access(auth, customer_id)?;
        Ok(self
            .campaigns
            .iter()
            .filter(|c| matches_filter(&c.id, campaign_ids))
            .cloned()
            .collect())
    }

    async fn fetch_ad_groups(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdGroupSnapshot>, AdsError> {
        self.check_access(auth, customer_id)?;
        Ok(self
            .ad_groups
            .iter()
            .filter(|g| matches_filter(&g.campaign_id, campaign_ids))
            .cloned()
            .collect())
    }

    async fn fetch_ads(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
    ) -> Result<Vec<AdSnapshot>, AdsError> {
        self.check_access(auth, customer_id)?;
        Ok(self
            .ads
            .iter()
            .filter(|a| matches_filter(&a.campaign_id, campaign_ids))
            .cloned()
            .collect())
    }

    async fn fetch_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        _date_range: DateRange,
    ) -> Result<Vec<KeywordSnapshot>, AdsError> {
        self.check_access(auth, customer_id)?;
        Ok(self
            .keywords
            .iter()
            .filter(|k| matches_filter(&k.campaign_id, campaign_ids))
            .cloned()
            .collect())
    }

    async fn fetch_search_terms(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_ids: &[String],
        _date_range: DateRange,
    ) -> Result<Vec<SearchTermSnapshot>, AdsError> {
        self.check_access(auth, customer_id)?;
        Ok(self
            .search_terms
            .iter()
            .filter(|t| matches_filter(&t.campaign_id, campaign_ids))
            .cloned()
            .collect())
    }

    async fn set_campaign_status(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        status: CampaignStatus,
    ) -> Result<String, AdsError> {
        self.check_access(auth, customer_id)?;
        self.fail_if_flagged(campaign_id)?;
        self.record(format!("status {} {}", campaign_id, status.as_api_str()));
        Ok(format!("customers/{}/campaigns/{}", customer_id, campaign_id))
    }

    async fn update_campaign_budget(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        budget_id: &str,
        amount_micros: i64,
    ) -> Result<String, AdsError> {
        self.check_access(auth, customer_id)?;
        self.record(format!("budget {} {}", budget_id, amount_micros));
        Ok(format!("customers/{}/campaignBudgets/{}", customer_id, budget_id))
    }

    async fn add_negative_keywords(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign_id: &str,
        keywords: &[String],
        match_type: KeywordMatchType,
    ) -> Result<Vec<String>, AdsError> {
        self.check_access(auth, customer_id)?;
        self.fail_if_flagged(campaign_id)?;
        Ok(keywords
            .iter()
            .enumerate()
            .map(|(i, keyword)| {
                self.record(format!(
                    "negative {} {} {}",
                    campaign_id,
                    keyword,
                    match_type.as_api_str()
                ));
                format!("customers/{}/campaignCriteria/{}~{}", customer_id, campaign_id, i)
            })
            .collect())
    }

    async fn update_keyword_bid(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        ad_group_id: &str,
        criterion_id: &str,
        cpc_bid_micros: i64,
    ) -> Result<String, AdsError> {
        self.check_access(auth, customer_id)?;
        self.record(format!("bid {}~{} {}", ad_group_id, criterion_id, cpc_bid_micros));
        Ok(format!(
            "customers/{}/adGroupCriteria/{}~{}",
            customer_id, ad_group_id, criterion_id
        ))
    }

    async fn create_campaign(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        campaign: &NewCampaign,
    ) -> Result<CreatedCampaign, AdsError> {
        self.check_access(auth, customer_id)?;
        self.record(format!("create {}", campaign.name));
        Ok(CreatedCampaign {
            budget_resource_name: format!("customers/{}/campaignBudgets/900", customer_id),
            campaign_resource_name: format!("customers/{}/campaigns/901", customer_id),
        })
    }
}
