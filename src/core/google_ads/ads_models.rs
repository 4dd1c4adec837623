// Domain models for the Google Ads gateway.
// These are point-in-time snapshots; nothing here is ever persisted.
// Money stays in micros (1 currency unit = 1_000_000 micros) the same way the API reports it.

use serde::{Deserialize, Serialize};

use super::ads_api::AdsError;

/// Headers every Google Ads call carries.
///
/// `login_customer_id` is only set when the target customer is reached through
/// a manager account. See `ManagerResolver` for how it gets picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdsAuth {
    pub access_token: String,
    pub developer_token: String,
    pub login_customer_id: Option<String>,
}

impl AdsAuth {
    pub fn new(access_token: impl Into<String>, developer_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            developer_token: developer_token.into(),
            login_customer_id: None,
        }
    }

    /// Same credentials, different `login-customer-id`.
    pub fn acting_as(&self, login_customer_id: Option<&str>) -> Self {
        Self {
            access_token: self.access_token.clone(),
            developer_token: self.developer_token.clone(),
            login_customer_id: login_customer_id.map(str::to_string),
        }
    }
}

/// Strips the formatting people paste into the UI ("123-456-7890", "customers/123")
/// and rejects anything that isn't a numeric id.
pub fn normalize_customer_id(raw: &str) -> Result<String, AdsError> {
    let trimmed = raw.trim().trim_start_matches("customers/");
    let digits: String = trimmed.chars().filter(|c| *c != '-' && *c != ' ').collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AdsError::InvalidCustomerId(raw.to_string()));
    }

    Ok(digits)
}

/// Resource ids in mutate paths (campaign, budget, ad group, criterion) are
/// plain numbers; anything else would only come back as an API error.
pub fn require_numeric_id(field: &str, value: &str) -> Result<(), AdsError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AdsError::InvalidRequest(format!(
            "{field} must be a numeric id, got `{value}`"
        )));
    }
    Ok(())
}

/// Reporting windows supported by the dashboard, as GAQL `DURING` literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "LAST_7_DAYS")]
    Last7Days,
    #[default]
    #[serde(rename = "LAST_30_DAYS")]
    Last30Days,
    #[serde(rename = "THIS_MONTH")]
    ThisMonth,
    #[serde(rename = "LAST_MONTH")]
    LastMonth,
}

impl DateRange {
    pub fn gaql(&self) -> &'static str {
        match self {
            DateRange::Last7Days => "LAST_7_DAYS",
            DateRange::Last30Days => "LAST_30_DAYS",
            DateRange::ThisMonth => "THIS_MONTH",
            DateRange::LastMonth => "LAST_MONTH",
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// The metric columns shared by every report we pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub impressions: i64,
    pub clicks: i64,
    pub cost_micros: i64,
    pub conversions: f64,
    pub conversions_value: f64,
}

impl Metrics {
    /// Click-through rate as a percentage. `None` without impressions.
    pub fn ctr_percent(&self) -> Option<f64> {
        (self.impressions > 0).then(|| self.clicks as f64 * 100.0 / self.impressions as f64)
    }

    /// Conversions per click as a percentage. `None` without clicks.
    pub fn conversion_rate_percent(&self) -> Option<f64> {
        (self.clicks > 0).then(|| self.conversions * 100.0 / self.clicks as f64)
    }

    pub fn cpc_micros(&self) -> Option<f64> {
        (self.clicks > 0).then(|| self.cost_micros as f64 / self.clicks as f64)
    }

    pub fn cpa_micros(&self) -> Option<f64> {
        (self.conversions > 0.0).then(|| self.cost_micros as f64 / self.conversions)
    }

    pub fn accumulate(&mut self, other: &Metrics) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.cost_micros += other.cost_micros;
        self.conversions += other.conversions;
        self.conversions_value += other.conversions_value;
    }

    pub fn total<'a>(items: impl IntoIterator<Item = &'a Metrics>) -> Metrics {
        let mut total = Metrics::default();
        for metrics in items {
            total.accumulate(metrics);
        }
        total
    }
}

// ============================================================================
// ACCOUNTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub customer_id: String,
    pub descriptive_name: Option<String>,
    pub is_manager: bool,
    pub currency_code: Option<String>,
    pub time_zone: Option<String>,
}

/// A `customer_client` row seen from a manager account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAccount {
    pub customer_id: String,
    pub descriptive_name: Option<String>,
    pub is_manager: bool,
    pub level: u32,
}

// ============================================================================
// REPORT SNAPSHOTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSnapshot {
    pub id: String,
    pub name: String,
    pub status: String,
    pub channel_type: Option<String>,
    pub budget_id: Option<String>,
    pub budget_amount_micros: Option<i64>,
    pub metrics: Metrics,
}

impl CampaignSnapshot {
    pub fn is_enabled(&self) -> bool {
        self.status == "ENABLED"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdGroupSnapshot {
    pub id: String,
    pub campaign_id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSnapshot {
    pub ad_id: String,
    pub ad_group_id: String,
    pub campaign_id: String,
    pub status: String,
    /// EXCELLENT / GOOD / AVERAGE / POOR, or something we don't score.
    pub ad_strength: Option<String>,
    pub headlines: Vec<String>,
    pub final_urls: Vec<String>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSnapshot {
    pub criterion_id: String,
    pub ad_group_id: String,
    pub campaign_id: String,
    pub text: String,
    pub match_type: String,
    pub status: String,
    pub quality_score: Option<u8>,
    pub cpc_bid_micros: Option<i64>,
    pub metrics: Metrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTermSnapshot {
    pub search_term: String,
    pub campaign_id: String,
    pub ad_group_id: String,
    /// ADDED / EXCLUDED / ADDED_EXCLUDED / NONE.
    pub status: String,
    pub metrics: Metrics,
}

impl SearchTermSnapshot {
    pub fn is_excluded(&self) -> bool {
        self.status.contains("EXCLUDED")
    }
}

// ============================================================================
// MUTATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Enabled,
    Paused,
}

impl CampaignStatus {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            CampaignStatus::Enabled => "ENABLED",
            CampaignStatus::Paused => "PAUSED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeywordMatchType {
    #[default]
    Exact,
    Phrase,
    Broad,
}

impl KeywordMatchType {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            KeywordMatchType::Exact => "EXACT",
            KeywordMatchType::Phrase => "PHRASE",
            KeywordMatchType::Broad => "BROAD",
        }
    }
}

/// Input for creating a search campaign together with its own budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
    pub daily_budget_micros: i64,
    #[serde(default = "default_channel_type")]
    pub channel_type: String,
    /// New campaigns start paused unless the caller says otherwise.
    #[serde(default = "default_new_campaign_status")]
    pub status: CampaignStatus,
    #[serde(default)]
    pub target_search_network: bool,
}

fn default_channel_type() -> String {
    "SEARCH".to_string()
}

fn default_new_campaign_status() -> CampaignStatus {
    CampaignStatus::Paused
}

impl NewCampaign {
    pub fn validate(&self) -> Result<(), AdsError> {
        if self.name.trim().is_empty() {
            return Err(AdsError::InvalidRequest(
                "campaign name must not be empty".to_string(),
            ));
        }
        if self.daily_budget_micros < 1_000_000 {
            return Err(AdsError::InvalidRequest(
                "daily budget must be at least 1 currency unit".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCampaign {
    pub budget_resource_name: String,
    pub campaign_resource_name: String,
}
