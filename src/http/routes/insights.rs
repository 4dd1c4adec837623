// AI insight endpoint. The kind in the path picks which data gets fetched and
// which prompt is used; the report always comes back, AI or not.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::core::analysis::{
    health_score, negative_keyword_candidates, performance_flags, NegativeKeywordCriteria,
};
use crate::core::insights::{InsightKind, InsightReport};
use crate::http::api_error::{ok, ApiJson, ApiResult, Envelope};
use crate::http::app_state::AppState;
use crate::http::session_auth::AuthUser;

use super::analysis::AccountData;
use super::reports::ReportRequest;

pub async fn generate(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    user: AuthUser,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<Json<Envelope<InsightReport>>> {
    let kind: InsightKind = kind.parse()?;
    let session = state.session(&user.user_id, req.customer_id.as_deref()).await?;
    let (auth, customer_id) = (&session.auth, session.customer_id.as_str());

    let data: Value = match kind {
        InsightKind::Campaigns => {
            let campaigns = state
                .ads
                .fetch_campaigns(auth, customer_id, req.date_range, &req.campaign_ids)
                .await?;
            let flags = performance_flags(&campaigns, None);
            json!({
                "dateRange": req.date_range,
                "campaigns": campaigns,
                "flags": flags,
            })
        }
        InsightKind::SearchTerms => {
            let terms = state
                .ads
                .fetch_search_terms(auth, customer_id, &req.campaign_ids, req.date_range)
                .await?;
            let candidates =
                negative_keyword_candidates(&terms, NegativeKeywordCriteria::default());
            json!({
                "dateRange": req.date_range,
                "searchTerms": terms,
                "negativeKeywordCandidates": candidates,
            })
        }
        InsightKind::Audit => {
            let account = AccountData::fetch(&state, &session, &req).await?;
            let score = health_score(account.snapshot());
            let flags = performance_flags(&account.campaigns, None);
            json!({
                "dateRange": req.date_range,
                "healthScore": score,
                "flags": flags,
                "campaigns": account.campaigns,
                "keywordCount": account.keywords.len(),
                "adCount": account.ads.len(),
            })
        }
    };

    let report = state.insights.generate(kind, &data).await;
    Ok(ok(report))
}
