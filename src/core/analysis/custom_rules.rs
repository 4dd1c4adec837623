// User-defined automation rules: "if <metric> <comparator> <threshold> then <action>".
// Evaluation only proposes actions; nothing is applied until the optimization
// executor is handed the result.

use serde::{Deserialize, Serialize};

use crate::core::google_ads::{CampaignSnapshot, Metrics};
use crate::core::optimization::OptimizationAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    Impressions,
    Clicks,
    /// In currency units, not micros.
    Cost,
    Conversions,
    /// Percent.
    Ctr,
    /// In currency units.
    Cpc,
    /// Percent.
    ConversionRate,
    /// In currency units.
    Cpa,
}

impl RuleMetric {
    /// `None` when the metric is undefined (a ratio with a zero denominator).
    pub fn value(&self, metrics: &Metrics) -> Option<f64> {
        match self {
            RuleMetric::Impressions => Some(metrics.impressions as f64),
            RuleMetric::Clicks => Some(metrics.clicks as f64),
            RuleMetric::Cost => Some(metrics.cost_micros as f64 / 1_000_000.0),
            RuleMetric::Conversions => Some(metrics.conversions),
            RuleMetric::Ctr => metrics.ctr_percent(),
            RuleMetric::Cpc => metrics.cpc_micros().map(|m| m / 1_000_000.0),
            RuleMetric::ConversionRate => metrics.conversion_rate_percent(),
            RuleMetric::Cpa => metrics.cpa_micros().map(|m| m / 1_000_000.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "==")]
    Eq,
}

impl Comparator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Gte => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Lte => value <= threshold,
            Comparator::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    PauseCampaign,
    ReduceBudget { percent: u8 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub name: String,
    pub metric: RuleMetric,
    pub comparator: Comparator,
    pub threshold: f64,
    pub action: RuleAction,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl CustomRule {
    pub fn matches(&self, metrics: &Metrics) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        self.metric
            .value(metrics)
            .filter(|value| self.comparator.holds(*value, self.threshold))
    }

    fn propose(&self, campaign: &CampaignSnapshot) -> OptimizationAction {
        match self.action {
            RuleAction::PauseCampaign => OptimizationAction::PauseCampaign {
                campaign_id: campaign.id.clone(),
            },
            RuleAction::ReduceBudget { percent } => OptimizationAction::ReduceBudget {
                campaign_id: campaign.id.clone(),
                budget_id: campaign.budget_id.clone(),
                current_amount_micros: campaign.budget_amount_micros.unwrap_or(0),
                percent,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub rule_name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub metric_value: f64,
    pub proposed_action: OptimizationAction,
}

/// Every (rule, campaign) pair that matches, rules in the order given.
pub fn evaluate_rules(rules: &[CustomRule], campaigns: &[CampaignSnapshot]) -> Vec<RuleMatch> {
    let mut matches = Vec::new();

    for rule in rules {
        for campaign in campaigns {
            if let Some(value) = rule.matches(&campaign.metrics) {
                matches.push(RuleMatch {
                    rule_name: rule.name.clone(),
                    campaign_id: campaign.id.clone(),
                    campaign_name: campaign.name.clone(),
                    metric_value: value,
                    proposed_action: rule.propose(campaign),
                });
            }
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::google_ads::fake_ads_api::{campaign, metrics};

    fn rule(metric: RuleMetric, comparator: Comparator, threshold: f64, action: RuleAction) -> CustomRule {
        CustomRule {
            name: "rule".to_string(),
            metric,
            comparator,
            threshold,
            action,
            enabled: true,
        }
    }

    #[test]
    fn rule_parses_from_ui_json() {
        let parsed: CustomRule = serde_json::from_str(
            r#"{"name":"Cut spenders","metric":"cpa","comparator":">=","threshold":50,
                "action":{"type":"REDUCE_BUDGET","percent":20}}"#,
        )
        .unwrap();
        assert_eq!(parsed.metric, RuleMetric::Cpa);
        assert_eq!(parsed.comparator, Comparator::Gte);
        assert_eq!(parsed.action, RuleAction::ReduceBudget { percent: 20 });
        assert!(parsed.enabled);
    }

    #[test]
    fn matching_campaigns_get_a_proposal() {
        let campaigns = vec![
            campaign("1", "Expensive", metrics(1_000, 10, 60_000_000, 0.0)),
            campaign("2", "Cheap", metrics(1_000, 10, 5_000_000, 0.0)),
        ];
        let rules = vec![rule(RuleMetric::Cost, Comparator::Gt, 50.0, RuleAction::PauseCampaign)];

        let matches = evaluate_rules(&rules, &campaigns);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].campaign_id, "1");
        assert_eq!(matches[0].metric_value, 60.0);
        assert_eq!(
            matches[0].proposed_action,
            OptimizationAction::PauseCampaign {
                campaign_id: "1".to_string()
            }
        );
    }

    #[test]
    fn reduce_budget_carries_the_current_budget() {
        let campaigns = vec![campaign("1", "Brand", metrics(1_000, 10, 1_000_000, 0.0))];
        let rules = vec![rule(
            RuleMetric::Clicks,
            Comparator::Eq,
            10.0,
            RuleAction::ReduceBudget { percent: 25 },
        )];

        let matches = evaluate_rules(&rules, &campaigns);

        assert_eq!(
            matches[0].proposed_action,
            OptimizationAction::ReduceBudget {
                campaign_id: "1".to_string(),
                budget_id: Some("91".to_string()),
                current_amount_micros: 10_000_000,
                percent: 25,
            }
        );
    }

    #[test]
    fn disabled_rules_never_match() {
        let campaigns = vec![campaign("1", "Any", metrics(1_000, 10, 1_000_000, 0.0))];
        let mut disabled = rule(RuleMetric::Impressions, Comparator::Gte, 0.0, RuleAction::PauseCampaign);
        disabled.enabled = false;

        assert!(evaluate_rules(&[disabled], &campaigns).is_empty());
    }

    #[test]
    fn undefined_ratios_never_match() {
        // No conversions: CPA is undefined, so "CPA < 1000" must not fire.
        let campaigns = vec![campaign("1", "Zero", metrics(1_000, 0, 0, 0.0))];
        let rules = vec![
            rule(RuleMetric::Cpa, Comparator::Lt, 1_000.0, RuleAction::PauseCampaign),
            rule(RuleMetric::Cpc, Comparator::Lt, 1_000.0, RuleAction::PauseCampaign),
            rule(RuleMetric::ConversionRate, Comparator::Lt, 100.0, RuleAction::PauseCampaign),
        ];

        assert!(evaluate_rules(&rules, &campaigns).is_empty());
    }

    #[test]
    fn percentage_metrics_compare_in_percent() {
        let campaigns = vec![campaign("1", "Low CTR", metrics(1_000, 5, 0, 0.0))];
        let rules = vec![rule(RuleMetric::Ctr, Comparator::Lt, 1.0, RuleAction::PauseCampaign)];

        let matches = evaluate_rules(&rules, &campaigns);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].metric_value, 0.5);
    }
}
