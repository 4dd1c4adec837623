// HTTP routes.
// Each feature gets its own handler file; this file wires them to paths.

pub mod accounts;

pub mod analysis;

pub mod insights;

pub mod mutations;

pub mod reports;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::app_state::AppState;

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        // Credentials and accounts
        .route(
            "/api/credentials",
            get(accounts::credential_status).put(accounts::save_credentials),
        )
        .route("/api/accounts", post(accounts::list_accounts))
        .route("/api/mcc/detect", post(accounts::detect_hierarchy))
        .route("/api/mcc/hierarchy", get(accounts::stored_hierarchy))
        .route("/api/mcc/resolve", post(accounts::resolve_manager))
        // Reports
        .route("/api/campaigns", post(reports::campaigns))
        .route("/api/ads", post(reports::ads))
        .route("/api/keywords", post(reports::keywords))
        .route("/api/search-terms", post(reports::search_terms))
        // Analyzers
        .route("/api/analysis/health-score", post(analysis::health))
        .route("/api/analysis/budget-pacing", post(analysis::pacing))
        .route("/api/analysis/flags", post(analysis::flags))
        .route("/api/rules/evaluate", post(analysis::rules))
        .route(
            "/api/search-terms/negative-candidates",
            post(analysis::negative_candidates),
        )
        // Mutations
        .route("/api/optimizations/apply", post(mutations::apply_optimizations))
        .route("/api/campaigns/status", post(mutations::campaign_status))
        .route("/api/campaigns/budget", post(mutations::campaign_budget))
        .route("/api/campaigns/create", post(mutations::create_campaign))
        .route("/api/keywords/negative", post(mutations::negative_keywords))
        .route("/api/keywords/bid", post(mutations::keyword_bid))
        // AI
        .route("/api/insights/{kind}", post(insights::generate))
        .with_state(state)
}
