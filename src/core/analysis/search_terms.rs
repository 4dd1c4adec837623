use std::collections::BTreeMap;

use serde::Deserialize;

use crate::core::google_ads::{KeywordMatchType, Metrics, SearchTermSnapshot};
use crate::core::optimization::OptimizationAction;

/// Thresholds for calling a search term wasted spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NegativeKeywordCriteria {
    pub min_cost_micros: i64,
    pub min_clicks: i64,
}

impl Default for NegativeKeywordCriteria {
    fn default() -> Self {
        Self {
            min_cost_micros: 5_000_000,
            min_clicks: 5,
        }
    }
}

/// Non-converting, not yet excluded search terms that cost at least the
/// thresholds, proposed as exact-match negatives, most expensive first.
///
/// The report has one row per ad group, so rows are summed per
/// (campaign, term) first; each pair gets at most one proposal.
pub fn negative_keyword_candidates(
    terms: &[SearchTermSnapshot],
    criteria: NegativeKeywordCriteria,
) -> Vec<OptimizationAction> {
    let mut per_campaign: BTreeMap<(&str, &str), Metrics> = BTreeMap::new();
    for term in terms.iter().filter(|t| !t.is_excluded()) {
        per_campaign
            .entry((term.campaign_id.as_str(), term.search_term.as_str()))
            .or_default()
            .accumulate(&term.metrics);
    }

    let mut wasted: Vec<((&str, &str), Metrics)> = per_campaign
        .into_iter()
        .filter(|(_, m)| m.conversions == 0.0)
        .filter(|(_, m)| m.cost_micros >= criteria.min_cost_micros)
        .filter(|(_, m)| m.clicks >= criteria.min_clicks)
        .collect();

    wasted.sort_by(|a, b| b.1.cost_micros.cmp(&a.1.cost_micros));

    wasted
        .into_iter()
        .map(|((campaign_id, keyword), _)| OptimizationAction::AddNegativeKeyword {
            campaign_id: campaign_id.to_string(),
            keyword: keyword.to_string(),
            match_type: KeywordMatchType::Exact,
        })
        .collect()
}
