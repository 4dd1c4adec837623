use serde::{Deserialize, Serialize};

use crate::core::google_ads::KeywordMatchType;

/// Budgets are never cut below one currency unit per day.
pub const MIN_BUDGET_MICROS: i64 = 1_000_000;
/// Reduced budgets are rounded down to this step (one cent).
pub const BUDGET_STEP_MICROS: i64 = 10_000;

/// A mutation proposed by an analyzer or the AI, and possibly confirmed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationAction {
    #[serde(rename_all = "camelCase")]
    PauseCampaign { campaign_id: String },

    #[serde(rename_all = "camelCase")]
    AddNegativeKeyword {
        campaign_id: String,
        keyword: String,
        #[serde(default)]
        match_type: KeywordMatchType,
    },

    #[serde(rename_all = "camelCase")]
    AdjustBid {
        ad_group_id: String,
        criterion_id: String,
        cpc_bid_micros: i64,
    },

    #[serde(rename_all = "camelCase")]
    ReduceBudget {
        campaign_id: String,
        budget_id: Option<String>,
        current_amount_micros: i64,
        percent: u8,
    },
}

impl OptimizationAction {
    pub fn label(&self) -> &'static str {
        match self {
            OptimizationAction::PauseCampaign { .. } => "PAUSE_CAMPAIGN",
            OptimizationAction::AddNegativeKeyword { .. } => "ADD_NEGATIVE_KEYWORD",
            OptimizationAction::AdjustBid { .. } => "ADJUST_BID",
            OptimizationAction::ReduceBudget { .. } => "REDUCE_BUDGET",
        }
    }
}

/// `current` cut by `percent`, floored to whole cents and kept above the minimum.
///
/// `None` when the budget is already at or below the minimum: there is nothing
/// left to cut, and the minimum would be a raise.
pub fn reduced_budget_micros(current_amount_micros: i64, percent: u8) -> Option<i64> {
    if current_amount_micros <= MIN_BUDGET_MICROS {
        return None;
    }
    let percent = i64::from(percent.min(100));
    let reduced = current_amount_micros.saturating_mul(100 - percent) / 100;
    let floored = reduced - reduced.rem_euclid(BUDGET_STEP_MICROS);
    Some(floored.max(MIN_BUDGET_MICROS))
}

/// Outcome of one action in a batch; `index` is its position in the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub index: usize,
    pub action: OptimizationAction,
    pub success: bool,
    pub error: Option<String>,
    pub resource_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<OptimizationResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<OptimizationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}
