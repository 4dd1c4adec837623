// Analyzer endpoints. Fetch what the analyzer needs, run it, return the result.
// Nothing here mutates the account; proposals come back as OptimizationActions
// the UI can send to /api/optimizations/apply.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::analysis::{
    budget_pacing, evaluate_rules, health_score, negative_keyword_candidates, performance_flags,
    AccountSnapshot, BudgetPacing, CustomRule, HealthScore, NegativeKeywordCriteria,
    PerformanceFlag, RuleMatch,
};
use crate::core::google_ads::{
    AdGroupSnapshot, AdSnapshot, AdsSession, CampaignSnapshot, DateRange, KeywordSnapshot,
};
use crate::core::optimization::OptimizationAction;
use crate::http::api_error::{ok, ApiJson, ApiResult, Envelope};
use crate::http::app_state::AppState;
use crate::http::session_auth::AuthUser;

use super::reports::ReportRequest;

/// Everything the health score looks at, fetched for one customer.
pub struct AccountData {
    pub campaigns: Vec<CampaignSnapshot>,
    pub ad_groups: Vec<AdGroupSnapshot>,
    pub ads: Vec<AdSnapshot>,
    pub keywords: Vec<KeywordSnapshot>,
}

impl AccountData {
    pub async fn fetch(
        state: &AppState,
        session: &AdsSession,
        req: &ReportRequest,
    ) -> ApiResult<Self> {
        let (auth, customer_id) = (&session.auth, session.customer_id.as_str());
        let campaigns = state
            .ads
            .fetch_campaigns(auth, customer_id, req.date_range, &req.campaign_ids)
            .await?;
        let ad_groups = state
            .ads
            .fetch_ad_groups(auth, customer_id, &req.campaign_ids)
            .await?;
        let ads = state.ads.fetch_ads(auth, customer_id, &req.campaign_ids).await?;
        let keywords = state
            .ads
            .fetch_keywords(auth, customer_id, &req.campaign_ids, req.date_range)
            .await?;

        Ok(Self {
            campaigns,
            ad_groups,
            ads,
            keywords,
        })
    }

    pub fn snapshot(&self) -> AccountSnapshot<'_> {
        AccountSnapshot {
            campaigns: &self.campaigns,
            ad_groups: &self.ad_groups,
            ads: &self.ads,
            keywords: &self.keywords,
        }
    }
}

// ============================================================================
// HEALTH SCORE
// ============================================================================

pub async fn health(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<HealthScore>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let account = AccountData::fetch(&state, &session, &req).await?;
    Ok(ok(health_score(account.snapshot())))
}

// ============================================================================
// BUDGET PACING
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacingRequest {
    pub customer_id: Option<String>,
    pub campaign_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPacing {
    pub campaign_id: String,
    pub campaign_name: String,
    pub pacing: BudgetPacing,
}

/// Month-to-date pacing for every enabled campaign that has a budget.
pub async fn pacing(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PacingRequest>,
) -> ApiResult<Json<Envelope<Vec<CampaignPacing>>>> {
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let campaigns = state
        .ads
        .fetch_campaigns(
            &session.auth,
            &session.customer_id,
            DateRange::ThisMonth,
            &req.campaign_ids,
        )
        .await?;

    let today = Utc::now().date_naive();
    let rows = campaigns
        .into_iter()
        .filter(|c| c.is_enabled())
        .filter_map(|c| {
            let daily_budget = c.budget_amount_micros?;
            Some(CampaignPacing {
                pacing: budget_pacing(daily_budget, c.metrics.cost_micros, today),
                campaign_id: c.id,
                campaign_name: c.name,
            })
        })
        .collect();

    Ok(ok(rows))
}

// ============================================================================
// PERFORMANCE FLAGS
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlagsRequest {
    #[serde(flatten)]
    pub report: ReportRequest,
    pub target_cpa_micros: Option<i64>,
}

pub async fn flags(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<FlagsRequest>,
) -> ApiResult<Json<Envelope<Vec<PerformanceFlag>>>> {
    let report = &req.report;
    let session = state.session(&user.user_id, report.customer_id.as_deref()).await?;
    let campaigns = state
        .ads
        .fetch_campaigns(&session.auth, &session.customer_id, report.date_range, &report.campaign_ids)
        .await?;

    Ok(ok(performance_flags(&campaigns, req.target_cpa_micros)))
}

// ============================================================================
// CUSTOM RULES
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesRequest {
    #[serde(flatten)]
    pub report: ReportRequest,
    pub rules: Vec<CustomRule>,
}

pub async fn rules(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<RulesRequest>,
) -> ApiResult<Json<Envelope<Vec<RuleMatch>>>> {
    let report = &req.report;
    let session = state.session(&user.user_id, report.customer_id.as_deref()).await?;
    let campaigns = state
        .ads
        .fetch_campaigns(&session.auth, &session.customer_id, report.date_range, &report.campaign_ids)
        .await?;

    let matches = evaluate_rules(&req.rules, &campaigns);
    tracing::debug!(
        customer_id = session.customer_id.as_str(),
        rules = req.rules.len(),
        matches = matches.len(),
        "Evaluated custom rules"
    );
    Ok(ok(matches))
}

// ============================================================================
// NEGATIVE KEYWORD CANDIDATES
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegativeCandidatesRequest {
    #[serde(flatten)]
    pub report: ReportRequest,
    pub criteria: NegativeKeywordCriteria,
}

pub async fn negative_candidates(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<NegativeCandidatesRequest>,
) -> ApiResult<Json<Envelope<Vec<OptimizationAction>>>> {
    let report = &req.report;
    let session = state.session(&user.user_id, report.customer_id.as_deref()).await?;
    let terms = state
        .ads
        .fetch_search_terms(&session.auth, &session.customer_id, &report.campaign_ids, report.date_range)
        .await?;

    Ok(ok(negative_keyword_candidates(&terms, req.criteria)))
}
