use serde::Serialize;

use crate::core::google_ads::CampaignSnapshot;

const CRITICAL_CTR_PERCENT: f64 = 1.0;
const LOW_CTR_PERCENT: f64 = 2.0;
const LOW_CONVERSION_RATE_PERCENT: f64 = 1.0;
/// Clicks after which zero conversions stops being bad luck.
const WASTED_CLICKS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    LowCtr,
    NoConversions,
    LowConversionRate,
    HighCpa,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceFlag {
    pub campaign_id: String,
    pub campaign_name: String,
    pub kind: FlagKind,
    pub severity: Severity,
    pub message: String,
}

/// Flag campaigns that under-perform. Campaigns without impressions are skipped.
pub fn performance_flags(
    campaigns: &[CampaignSnapshot],
    target_cpa_micros: Option<i64>,
) -> Vec<PerformanceFlag> {
    let mut flags = Vec::new();

    for campaign in campaigns.iter().filter(|c| c.metrics.impressions > 0) {
        let metrics = &campaign.metrics;
        let mut flag = |kind, severity, message: String| {
            flags.push(PerformanceFlag {
                campaign_id: campaign.id.clone(),
                campaign_name: campaign.name.clone(),
                kind,
                severity,
                message,
            })
        };

        if let Some(ctr) = metrics.ctr_percent() {
            if ctr < CRITICAL_CTR_PERCENT {
                flag(
                    FlagKind::LowCtr,
                    Severity::Critical,
                    format!("CTR is {:.2}%, below {}%", ctr, CRITICAL_CTR_PERCENT),
                );
            } else if ctr < LOW_CTR_PERCENT {
                flag(
                    FlagKind::LowCtr,
                    Severity::Warning,
                    format!("CTR is {:.2}%, below {}%", ctr, LOW_CTR_PERCENT),
                );
            }
        }

        if metrics.clicks >= WASTED_CLICKS && metrics.conversions == 0.0 {
            flag(
                FlagKind::NoConversions,
                Severity::Critical,
                format!("{} clicks without a single conversion", metrics.clicks),
            );
        }

        if metrics.conversions > 0.0 {
            if let Some(rate) = metrics.conversion_rate_percent() {
                if rate < LOW_CONVERSION_RATE_PERCENT {
                    flag(
                        FlagKind::LowConversionRate,
                        Severity::Warning,
                        format!("Conversion rate is {:.2}%", rate),
                    );
                }
            }
        }

        if let (Some(target), Some(cpa)) = (target_cpa_micros, metrics.cpa_micros()) {
            if cpa > target as f64 {
                flag(
                    FlagKind::HighCpa,
                    Severity::Warning,
                    format!(
                        "CPA {:.2} is above the {:.2} target",
                        cpa / 1_000_000.0,
                        target as f64 / 1_000_000.0
                    ),
                );
            }
        }
    }

    flags
}
