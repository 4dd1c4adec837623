// GAQL query text and the row -> snapshot mapping for `googleAds:search`.
//
// The REST API returns every row as nested camelCase JSON, with int64 fields
// encoded as strings ("costMicros": "1230000"). Missing fields mean zero/null.

use serde_json::Value;

use crate::core::google_ads::{
    AdGroupSnapshot, AdSnapshot, AdsError, CampaignSnapshot, ClientAccount, CustomerInfo,
    DateRange, KeywordSnapshot, Metrics, SearchTermSnapshot,
};

// ============================================================================
// FIELD ACCESS
// ============================================================================

pub fn string_at(row: &Value, pointer: &str) -> Option<String> {
    match row.pointer(pointer)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn int_at(row: &Value, pointer: &str) -> Option<i64> {
    match row.pointer(pointer)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

pub fn float_at(row: &Value, pointer: &str) -> Option<f64> {
    match row.pointer(pointer)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

pub fn bool_at(row: &Value, pointer: &str) -> bool {
    row.pointer(pointer)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn required_string(row: &Value, pointer: &str) -> Result<String, AdsError> {
    string_at(row, pointer)
        .ok_or_else(|| AdsError::InvalidResponse(format!("row is missing {}", pointer)))
}

fn metrics(row: &Value) -> Metrics {
    Metrics {
        impressions: int_at(row, "/metrics/impressions").unwrap_or(0),
        clicks: int_at(row, "/metrics/clicks").unwrap_or(0),
        cost_micros: int_at(row, "/metrics/costMicros").unwrap_or(0),
        conversions: float_at(row, "/metrics/conversions").unwrap_or(0.0),
        conversions_value: float_at(row, "/metrics/conversionsValue").unwrap_or(0.0),
    }
}

// ============================================================================
// QUERIES
// ============================================================================

const METRIC_FIELDS: &str = "metrics.impressions, metrics.clicks, metrics.cost_micros, \
metrics.conversions, metrics.conversions_value";

pub const PROBE_QUERY: &str = "SELECT customer.id FROM customer LIMIT 1";

pub const CUSTOMER_INFO_QUERY: &str = "SELECT customer.id, customer.descriptive_name, \
customer.manager, customer.currency_code, customer.time_zone FROM customer LIMIT 1";

pub const CLIENT_ACCOUNTS_QUERY: &str = "SELECT customer_client.id, \
customer_client.descriptive_name, customer_client.manager, customer_client.level \
FROM customer_client WHERE customer_client.level <= 1";

/// ` AND campaign.id IN (...)`, or nothing for "all campaigns".
/// Ids are spliced into GAQL, so anything non-numeric is refused.
pub fn campaign_filter(campaign_ids: &[String]) -> Result<String, AdsError> {
    if campaign_ids.is_empty() {
        return Ok(String::new());
    }
    if let Some(bad) = campaign_ids
        .iter()
        .find(|id| id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AdsError::InvalidRequest(format!("invalid campaign id: {}", bad)));
    }
    Ok(format!(" AND campaign.id IN ({})", campaign_ids.join(", ")))
}

pub fn campaigns_query(date_range: DateRange, campaign_ids: &[String]) -> Result<String, AdsError> {
    Ok(format!(
        "SELECT campaign.id, campaign.name, campaign.status, campaign.advertising_channel_type, \
         campaign_budget.id, campaign_budget.amount_micros, {} FROM campaign \
         WHERE segments.date DURING {} AND campaign.status != 'REMOVED'{}",
        METRIC_FIELDS,
        date_range.gaql(),
        campaign_filter(campaign_ids)?
    ))
}

pub fn ad_groups_query(campaign_ids: &[String]) -> Result<String, AdsError> {
    Ok(format!(
        "SELECT ad_group.id, ad_group.name, ad_group.status, campaign.id FROM ad_group \
         WHERE ad_group.status != 'REMOVED'{}",
        campaign_filter(campaign_ids)?
    ))
}

pub fn ads_query(campaign_ids: &[String]) -> Result<String, AdsError> {
    Ok(format!(
        "SELECT ad_group_ad.ad.id, ad_group_ad.status, ad_group_ad.ad_strength, \
         ad_group_ad.ad.responsive_search_ad.headlines, ad_group_ad.ad.final_urls, \
         ad_group.id, campaign.id, {} FROM ad_group_ad \
         WHERE ad_group_ad.status != 'REMOVED'{}",
        METRIC_FIELDS,
        campaign_filter(campaign_ids)?
    ))
}

pub fn keywords_query(date_range: DateRange, campaign_ids: &[String]) -> Result<String, AdsError> {
    Ok(format!(
        "SELECT ad_group_criterion.criterion_id, ad_group_criterion.keyword.text, \
         ad_group_criterion.keyword.match_type, ad_group_criterion.status, \
         ad_group_criterion.quality_info.quality_score, ad_group_criterion.cpc_bid_micros, \
         ad_group.id, campaign.id, {} FROM keyword_view \
         WHERE segments.date DURING {} AND ad_group_criterion.status != 'REMOVED'{}",
        METRIC_FIELDS,
        date_range.gaql(),
        campaign_filter(campaign_ids)?
    ))
}

pub fn search_terms_query(
    date_range: DateRange,
    campaign_ids: &[String],
) -> Result<String, AdsError> {
    Ok(format!(
        "SELECT search_term_view.search_term, search_term_view.status, campaign.id, \
         ad_group.id, {} FROM search_term_view WHERE segments.date DURING {}{}",
        METRIC_FIELDS,
        date_range.gaql(),
        campaign_filter(campaign_ids)?
    ))
}

// ============================================================================
// ROW MAPPING
// ============================================================================

pub fn customer_info(row: &Value) -> Result<CustomerInfo, AdsError> {
    Ok(CustomerInfo {
        customer_id: required_string(row, "/customer/id")?,
        descriptive_name: string_at(row, "/customer/descriptiveName"),
        is_manager: bool_at(row, "/customer/manager"),
        currency_code: string_at(row, "/customer/currencyCode"),
        time_zone: string_at(row, "/customer/timeZone"),
    })
}

pub fn client_account(row: &Value) -> Result<ClientAccount, AdsError> {
    Ok(ClientAccount {
        customer_id: required_string(row, "/customerClient/id")?,
        descriptive_name: string_at(row, "/customerClient/descriptiveName"),
        is_manager: bool_at(row, "/customerClient/manager"),
        level: int_at(row, "/customerClient/level").unwrap_or(0) as u32,
    })
}

pub fn campaign(row: &Value) -> Result<CampaignSnapshot, AdsError> {
    Ok(CampaignSnapshot {
        id: required_string(row, "/campaign/id")?,
        name: string_at(row, "/campaign/name").unwrap_or_default(),
        status: string_at(row, "/campaign/status").unwrap_or_default(),
        channel_type: string_at(row, "/campaign/advertisingChannelType"),
        budget_id: string_at(row, "/campaignBudget/id"),
        budget_amount_micros: int_at(row, "/campaignBudget/amountMicros"),
        metrics: metrics(row),
    })
}

pub fn ad_group(row: &Value) -> Result<AdGroupSnapshot, AdsError> {
    Ok(AdGroupSnapshot {
        id: required_string(row, "/adGroup/id")?,
        campaign_id: required_string(row, "/campaign/id")?,
        name: string_at(row, "/adGroup/name").unwrap_or_default(),
        status: string_at(row, "/adGroup/status").unwrap_or_default(),
    })
}

pub fn ad(row: &Value) -> Result<AdSnapshot, AdsError> {
    let headlines = row
        .pointer("/adGroupAd/ad/responsiveSearchAd/headlines")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|h| string_at(h, "/text")).collect())
        .unwrap_or_default();
    let final_urls = row
        .pointer("/adGroupAd/ad/finalUrls")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(AdSnapshot {
        ad_id: required_string(row, "/adGroupAd/ad/id")?,
        ad_group_id: required_string(row, "/adGroup/id")?,
        campaign_id: required_string(row, "/campaign/id")?,
        status: string_at(row, "/adGroupAd/status").unwrap_or_default(),
        ad_strength: string_at(row, "/adGroupAd/adStrength"),
        headlines,
        final_urls,
        metrics: metrics(row),
    })
}

pub fn keyword(row: &Value) -> Result<KeywordSnapshot, AdsError> {
    Ok(KeywordSnapshot {
        criterion_id: required_string(row, "/adGroupCriterion/criterionId")?,
        ad_group_id: required_string(row, "/adGroup/id")?,
        campaign_id: required_string(row, "/campaign/id")?,
        text: string_at(row, "/adGroupCriterion/keyword/text").unwrap_or_default(),
        match_type: string_at(row, "/adGroupCriterion/keyword/matchType").unwrap_or_default(),
        status: string_at(row, "/adGroupCriterion/status").unwrap_or_default(),
        quality_score: int_at(row, "/adGroupCriterion/qualityInfo/qualityScore")
            .and_then(|q| u8::try_from(q).ok()),
        cpc_bid_micros: int_at(row, "/adGroupCriterion/cpcBidMicros"),
        metrics: metrics(row),
    })
}

pub fn search_term(row: &Value) -> Result<SearchTermSnapshot, AdsError> {
    Ok(SearchTermSnapshot {
        search_term: required_string(row, "/searchTermView/searchTerm")?,
        campaign_id: required_string(row, "/campaign/id")?,
        ad_group_id: string_at(row, "/adGroup/id").unwrap_or_default(),
        status: string_at(row, "/searchTermView/status").unwrap_or_else(|| "NONE".to_string()),
        metrics: metrics(row),
    })
}
