// AI insight generators.
//
// Each kind turns already-fetched account data into a prompt, asks the model for
// a fixed JSON shape, and parses the answer. When there is no provider, the call
// fails, or the answer can't be parsed, the caller still gets a static report
// marked `generated_by_ai = false`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::ai::{AiProvider, AiService};
use crate::core::optimization::OptimizationAction;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Unknown insight kind: {0}")]
    UnknownKind(String),

    #[error("AI request failed: {0}")]
    Provider(String),

    #[error("AI response was not valid insight JSON: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    Campaigns,
    SearchTerms,
    Audit,
}

impl FromStr for InsightKind {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaigns" => Ok(InsightKind::Campaigns),
            "search-terms" => Ok(InsightKind::SearchTerms),
            "audit" => Ok(InsightKind::Audit),
            other => Err(InsightError::UnknownKind(other.to_string())),
        }
    }
}

impl InsightKind {
    fn system_prompt(&self) -> &'static str {
        match self {
            InsightKind::Campaigns => {
                "You are a Google Ads performance analyst. Review the campaign metrics \
                 and point out what to scale, fix or pause."
            }
            InsightKind::SearchTerms => {
                "You are a Google Ads search-term analyst. Find wasted spend, negative \
                 keyword opportunities and terms worth adding as keywords."
            }
            InsightKind::Audit => {
                "You are auditing a Google Ads account. Use the health score, flags and \
                 campaign data to prioritise the most valuable fixes."
            }
        }
    }
}

const RESPONSE_FORMAT: &str = "Answer with a single JSON object and nothing else: \
{\"summary\": string, \"recommendations\": [{\"title\": string, \"description\": string, \
\"priority\": \"high\" | \"medium\" | \"low\", \"action\": optional object}]}. \
Money values in the data are in micros (1 unit = 1000000 micros).";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|p| p.trim().to_ascii_lowercase()).as_deref() {
            Some("high") | Some("critical") => Priority::High,
            Some("low") => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Only present when the model proposed something we can execute.
    pub action: Option<OptimizationAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub kind: InsightKind,
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
    pub generated_by_ai: bool,
}

#[derive(Deserialize)]
struct RawReport {
    summary: String,
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
}

#[derive(Deserialize)]
struct RawRecommendation {
    title: String,
    #[serde(default)]
    description: String,
    priority: Option<String>,
    action: Option<Value>,
}

/// Cut the JSON object out of a completion that may be wrapped in a code fence
/// or surrounded by prose.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_report(kind: InsightKind, text: &str) -> Result<InsightReport, InsightError> {
    let json = extract_json_object(text)
        .ok_or_else(|| InsightError::Parse("no JSON object in response".to_string()))?;
    let raw: RawReport =
        serde_json::from_str(json).map_err(|e| InsightError::Parse(e.to_string()))?;

    if raw.summary.trim().is_empty() {
        return Err(InsightError::Parse("empty summary".to_string()));
    }

    let recommendations = raw
        .recommendations
        .into_iter()
        .map(|r| Recommendation {
            title: r.title,
            description: r.description,
            priority: Priority::parse(r.priority.as_deref()),
            // An action we can't execute is dropped; the advice still stands.
            action: r.action.and_then(|a| serde_json::from_value(a).ok()),
        })
        .collect();

    Ok(InsightReport {
        kind,
        summary: raw.summary,
        recommendations,
        generated_by_ai: true,
    })
}

pub fn fallback_report(kind: InsightKind) -> InsightReport {
    let (summary, recommendations) = match kind {
        InsightKind::Campaigns => (
            "AI analysis is unavailable. Review campaigns with low CTR or spend without conversions first.",
            vec![
                ("Check low-CTR campaigns", "Campaigns under 2% CTR usually need tighter keywords or better ad copy.", Priority::High),
                ("Review spend without conversions", "Pause or restructure campaigns with 100+ clicks and no conversions.", Priority::High),
                ("Keep budgets on pace", "Compare month-to-date spend with the expected pace for each budget.", Priority::Medium),
            ],
        ),
        InsightKind::SearchTerms => (
            "AI analysis is unavailable. Look for search terms that spend without converting.",
            vec![
                ("Add negative keywords", "Exclude irrelevant search terms that keep costing money without conversions.", Priority::High),
                ("Promote converting terms", "Add converting search terms as exact-match keywords.", Priority::Medium),
            ],
        ),
        InsightKind::Audit => (
            "AI analysis is unavailable. Start with the lowest sub-scores of the health score.",
            vec![
                ("Fix account structure", "Every campaign needs ad groups and every ad group needs ads.", Priority::High),
                ("Improve quality scores", "Keywords below quality score 5 drag costs up.", Priority::Medium),
                ("Strengthen ad copy", "Bring ad strength to GOOD or EXCELLENT with more varied headlines.", Priority::Low),
            ],
        ),
    };

    InsightReport {
        kind,
        summary: summary.to_string(),
        recommendations: recommendations
            .into_iter()
            .map(|(title, description, priority)| Recommendation {
                title: title.to_string(),
                description: description.to_string(),
                priority,
                action: None,
            })
            .collect(),
        generated_by_ai: false,
    }
}

pub struct InsightService<P: AiProvider> {
    ai: Option<AiService<P>>,
}

impl<P: AiProvider> InsightService<P> {
    pub fn new(ai: Option<AiService<P>>) -> Self {
        Self { ai }
    }

    /// Never fails: anything that goes wrong degrades to the static report.
    pub async fn generate(&self, kind: InsightKind, data: &Value) -> InsightReport {
        match self.try_generate(kind, data).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(kind = ?kind, "Falling back to static insights: {}", e);
                fallback_report(kind)
            }
        }
    }

    async fn try_generate(&self, kind: InsightKind, data: &Value) -> Result<InsightReport, InsightError> {
        let ai = self
            .ai
            .as_ref()
            .ok_or_else(|| InsightError::Provider("no AI provider configured".to_string()))?;

        let system_prompt = format!("{} {}", kind.system_prompt(), RESPONSE_FORMAT);
        let user_prompt = format!("Account data:\n{}", data);

        let text = ai
            .complete(&system_prompt, &user_prompt)
            .await
            .map_err(|e| InsightError::Provider(e.to_string()))?;

        let report = parse_report(kind, &text)?;
        tracing::info!(
            kind = ?kind,
            model = ai.model(),
            recommendations = report.recommendations.len(),
            "Generated AI insights"
        );
        Ok(report)
    }
}
