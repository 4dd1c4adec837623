// Account health score.
//
// Five weighted sub-scores, each clamped to 0..=100, rolled into one number and
// a letter grade. Everything is computed from snapshots already fetched for the
// request, so this module never touches the network.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::core::google_ads::{AdGroupSnapshot, AdSnapshot, CampaignSnapshot, KeywordSnapshot, Metrics};

const STRUCTURE_WEIGHT: f64 = 0.20;
const PERFORMANCE_WEIGHT: f64 = 0.25;
const BUDGET_WEIGHT: f64 = 0.20;
const KEYWORD_WEIGHT: f64 = 0.20;
const AD_COPY_WEIGHT: f64 = 0.15;

/// Ad groups with more keywords than this are considered unfocused.
const MAX_FOCUSED_KEYWORDS: usize = 20;

/// Score used when there is nothing to judge a component by.
const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        if score >= 90 {
            Grade::A
        } else if score >= 80 {
            Grade::B
        } else if score >= 70 {
            Grade::C
        } else if score >= 60 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Raw counts the structure sub-score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureFindings {
    pub campaigns_without_ad_groups: usize,
    pub ad_groups_without_ads: usize,
    pub ad_groups_over_keyword_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub structure: f64,
    pub performance: f64,
    pub budget_efficiency: f64,
    pub keyword_quality: f64,
    pub ad_copy: f64,
}

impl SubScores {
    pub fn overall(&self) -> u32 {
        let weighted = self.structure * STRUCTURE_WEIGHT
            + self.performance * PERFORMANCE_WEIGHT
            + self.budget_efficiency * BUDGET_WEIGHT
            + self.keyword_quality * KEYWORD_WEIGHT
            + self.ad_copy * AD_COPY_WEIGHT;
        weighted.round().clamp(0.0, 100.0) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub overall: u32,
    pub grade: Grade,
    pub breakdown: SubScores,
    pub findings: StructureFindings,
}

/// Everything the score looks at for one account.
#[derive(Debug, Clone, Copy)]
pub struct AccountSnapshot<'a> {
    pub campaigns: &'a [CampaignSnapshot],
    pub ad_groups: &'a [AdGroupSnapshot],
    pub ads: &'a [AdSnapshot],
    pub keywords: &'a [KeywordSnapshot],
}

pub fn health_score(account: AccountSnapshot<'_>) -> HealthScore {
    let findings = structure_findings(account);
    let totals = Metrics::total(account.campaigns.iter().map(|c| &c.metrics));

    let breakdown = SubScores {
        structure: structure_score(&findings),
        performance: performance_score(&totals),
        budget_efficiency: budget_efficiency_score(account.campaigns),
        keyword_quality: keyword_quality_score(account.keywords),
        ad_copy: ad_copy_score(account.ads),
    };
    let overall = breakdown.overall();

    HealthScore {
        overall,
        grade: Grade::from_score(overall),
        breakdown,
        findings,
    }
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub fn structure_findings(account: AccountSnapshot<'_>) -> StructureFindings {
    let campaigns_with_groups: HashSet<&str> = account
        .ad_groups
        .iter()
        .map(|g| g.campaign_id.as_str())
        .collect();
    let groups_with_ads: HashSet<&str> =
        account.ads.iter().map(|a| a.ad_group_id.as_str()).collect();

    let mut keywords_per_group: HashMap<&str, usize> = HashMap::new();
    for keyword in account.keywords {
        *keywords_per_group
            .entry(keyword.ad_group_id.as_str())
            .or_default() += 1;
    }

    StructureFindings {
        campaigns_without_ad_groups: account
            .campaigns
            .iter()
            .filter(|c| !campaigns_with_groups.contains(c.id.as_str()))
            .count(),
        ad_groups_without_ads: account
            .ad_groups
            .iter()
            .filter(|g| !groups_with_ads.contains(g.id.as_str()))
            .count(),
        ad_groups_over_keyword_limit: keywords_per_group
            .values()
            .filter(|count| **count > MAX_FOCUSED_KEYWORDS)
            .count(),
    }
}

pub fn structure_score(findings: &StructureFindings) -> f64 {
    let penalty = 15.0 * findings.campaigns_without_ad_groups as f64
        + 10.0 * findings.ad_groups_without_ads as f64
        + 5.0 * findings.ad_groups_over_keyword_limit as f64;
    clamp_score(100.0 - penalty)
}

/// Half from CTR, half from conversion rate; 5% on either earns the full half.
pub fn performance_score(totals: &Metrics) -> f64 {
    let ctr_half = totals
        .ctr_percent()
        .map(|ctr| (ctr / 5.0).min(1.0) * 50.0)
        .unwrap_or(0.0);
    let conversion_half = totals
        .conversion_rate_percent()
        .map(|rate| (rate / 5.0).min(1.0) * 50.0)
        .unwrap_or(0.0);
    clamp_score(ctr_half + conversion_half)
}

/// Share of spend that went to campaigns which converted at all.
pub fn budget_efficiency_score(campaigns: &[CampaignSnapshot]) -> f64 {
    let total_cost: i64 = campaigns.iter().map(|c| c.metrics.cost_micros).sum();
    if total_cost <= 0 {
        return NEUTRAL_SCORE;
    }

    let converting_cost: i64 = campaigns
        .iter()
        .filter(|c| c.metrics.conversions > 0.0)
        .map(|c| c.metrics.cost_micros)
        .sum();

    clamp_score(100.0 * converting_cost as f64 / total_cost as f64)
}

pub fn keyword_quality_score(keywords: &[KeywordSnapshot]) -> f64 {
    let scores: Vec<f64> = keywords
        .iter()
        .filter_map(|k| k.quality_score)
        .map(f64::from)
        .collect();
    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }

    let count = scores.len() as f64;
    let average = scores.iter().sum::<f64>() / count;
    let low_share = scores.iter().filter(|s| **s < 5.0).count() as f64 / count;

    clamp_score(average * 10.0 - 20.0 * low_share)
}

fn ad_strength_points(strength: &str) -> Option<f64> {
    match strength {
        "EXCELLENT" => Some(100.0),
        "GOOD" => Some(75.0),
        "AVERAGE" => Some(50.0),
        "POOR" => Some(25.0),
        _ => None,
    }
}

pub fn ad_copy_score(ads: &[AdSnapshot]) -> f64 {
    let points: Vec<f64> = ads
        .iter()
        .filter_map(|ad| ad.ad_strength.as_deref())
        .filter_map(ad_strength_points)
        .collect();
    if points.is_empty() {
        return NEUTRAL_SCORE;
    }
    clamp_score(points.iter().sum::<f64>() / points.len() as f64)
}
