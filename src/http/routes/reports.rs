// Read-only report endpoints: campaigns, ads, keywords and search terms.
//
// Every handler follows the same three steps:
// 1. Open an Ads session (credentials + manager resolution)
// 2. Make the gateway call with the session's headers
// 3. Wrap the rows in the success envelope

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::google_ads::{
    AdSnapshot, CampaignSnapshot, DateRange, KeywordSnapshot, SearchTermSnapshot,
};
use crate::http::api_error::{ok, ApiJson, ApiResult, Envelope};
use crate::http::app_state::AppState;
use crate::http::session_auth::AuthUser;

/// Body shared by every report-style endpoint. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRequest {
    /// Falls back to the customer id stored with the user's credentials.
    pub customer_id: Option<String>,
    pub date_range: DateRange,
    /// Empty means every campaign.
    pub campaign_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<T> {
    pub customer_id: String,
    /// Manager account the rows were read through, if any.
    pub login_customer_id: Option<String>,
    pub rows: Vec<T>,
}

pub async fn campaigns(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<Report<CampaignSnapshot>>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let rows = state
        .ads
        .fetch_campaigns(&session.auth, &session.customer_id, req.date_range, &req.campaign_ids)
        .await?;

    Ok(ok(Report {
        login_customer_id: session.auth.login_customer_id,
        customer_id: session.customer_id,
        rows,
    }))
}

pub async fn ads(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<Report<AdSnapshot>>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let rows = state
        .ads
        .fetch_ads(&session.auth, &session.customer_id, &req.campaign_ids)
        .await?;

    Ok(ok(Report {
        login_customer_id: session.auth.login_customer_id,
        customer_id: session.customer_id,
        rows,
    }))
}

pub async fn keywords(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<Report<KeywordSnapshot>>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let rows = state
        .ads
        .fetch_keywords(&session.auth, &session.customer_id, &req.campaign_ids, req.date_range)
        .await?;

    Ok(ok(Report {
        login_customer_id: session.auth.login_customer_id,
        customer_id: session.customer_id,
        rows,
    }))
}

pub async fn search_terms(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<Report<SearchTermSnapshot>>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let rows = state
        .ads
        .fetch_search_terms(&session.auth, &session.customer_id, &req.campaign_ids, req.date_range)
        .await?;

    Ok(ok(Report {
        login_customer_id: session.auth.login_customer_id,
        customer_id: session.customer_id,
        rows,
    }))
}
