// Endpoints that change the Google Ads account. Each one validates its input
// before the session is opened so a bad request never costs an upstream call.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::google_ads::{
    require_numeric_id, CampaignStatus, CreatedCampaign, KeywordMatchType, NewCampaign,
};
use crate::core::optimization::optimization_models::MIN_BUDGET_MICROS;
use crate::core::optimization::{BatchSummary, OptimizationAction};
use crate::http::api_error::{ok, ApiError, ApiJson, ApiResult, Envelope};
use crate::http::app_state::AppState;
use crate::http::session_auth::AuthUser;

fn require_id(field: &str, value: &str) -> ApiResult<()> {
    require_numeric_id(field, value)?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutated {
    pub resource_name: String,
}

// ============================================================================
// OPTIMIZATION BATCH
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub customer_id: Option<String>,
    pub actions: Vec<OptimizationAction>,
}

pub async fn apply_optimizations(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<Json<Envelope<BatchSummary>>> {
    if req.actions.is_empty() {
        return Err(ApiError::bad_request("actions must not be empty"));
    }

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let summary = state
        .executor
        .apply_batch(&session.auth, &session.customer_id, req.actions)
        .await;
    Ok(ok(summary))
}

// ============================================================================
// CAMPAIGNS
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub customer_id: Option<String>,
    pub campaign_id: String,
    pub status: CampaignStatus,
}

pub async fn campaign_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<Envelope<Mutated>>> {
    require_id("campaignId", &req.campaign_id)?;

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let resource_name = state
        .ads
        .set_campaign_status(&session.auth, &session.customer_id, &req.campaign_id, req.status)
        .await?;

    tracing::info!(
        customer_id = session.customer_id.as_str(),
        campaign_id = req.campaign_id.as_str(),
        status = req.status.as_api_str(),
        "Campaign status changed"
    );
    Ok(ok(Mutated { resource_name }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub customer_id: Option<String>,
    pub budget_id: String,
    pub amount_micros: i64,
}

pub async fn campaign_budget(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<BudgetRequest>,
) -> ApiResult<Json<Envelope<Mutated>>> {
    require_id("budgetId", &req.budget_id)?;
    if req.amount_micros < MIN_BUDGET_MICROS {
        return Err(ApiError::bad_request(
            "amountMicros must be at least 1000000 (one currency unit)",
        ));
    }

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let resource_name = state
        .ads
        .update_campaign_budget(&session.auth, &session.customer_id, &req.budget_id, req.amount_micros)
        .await?;

    tracing::info!(
        customer_id = session.customer_id.as_str(),
        budget_id = req.budget_id.as_str(),
        amount_micros = req.amount_micros,
        "Campaign budget updated"
    );
    Ok(ok(Mutated { resource_name }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub customer_id: Option<String>,
    #[serde(flatten)]
    pub campaign: NewCampaign,
}

pub async fn create_campaign(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateCampaignRequest>,
) -> ApiResult<Json<Envelope<CreatedCampaign>>> {
    req.campaign.validate()?;

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let created = state
        .ads
        .create_campaign(&session.auth, &session.customer_id, &req.campaign)
        .await?;

    tracing::info!(
        customer_id = session.customer_id.as_str(),
        campaign = created.campaign_resource_name.as_str(),
        "Campaign created"
    );
    Ok(ok(created))
}

// ============================================================================
// KEYWORDS
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeywordsRequest {
    pub customer_id: Option<String>,
    pub campaign_id: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub match_type: KeywordMatchType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeKeywordsAdded {
    pub resource_names: Vec<String>,
}

pub async fn negative_keywords(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<NegativeKeywordsRequest>,
) -> ApiResult<Json<Envelope<NegativeKeywordsAdded>>> {
    require_id("campaignId", &req.campaign_id)?;
    let keywords: Vec<String> = req
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(ApiError::bad_request("keywords must not be empty"));
    }

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let resource_names = state
        .ads
        .add_negative_keywords(
            &session.auth,
            &session.customer_id,
            &req.campaign_id,
            &keywords,
            req.match_type,
        )
        .await?;

    tracing::info!(
        customer_id = session.customer_id.as_str(),
        campaign_id = req.campaign_id.as_str(),
        count = resource_names.len(),
        "Negative keywords added"
    );
    Ok(ok(NegativeKeywordsAdded { resource_names }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub customer_id: Option<String>,
    pub ad_group_id: String,
    pub criterion_id: String,
    pub cpc_bid_micros: i64,
}

pub async fn keyword_bid(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<BidRequest>,
) -> ApiResult<Json<Envelope<Mutated>>> {
    require_id("adGroupId", &req.ad_group_id)?;
    require_id("criterionId", &req.criterion_id)?;
    if req.cpc_bid_micros <= 0 {
        return Err(ApiError::bad_request("cpcBidMicros must be positive"));
    }

    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let resource_name = state
        .ads
        .update_keyword_bid(
            &session.auth,
            &session.customer_id,
            &req.ad_group_id,
            &req.criterion_id,
            req.cpc_bid_micros,
        )
        .await?;

    Ok(ok(Mutated { resource_name }))
}
