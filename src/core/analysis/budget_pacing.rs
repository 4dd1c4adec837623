use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Spend this far ahead of the straight-line expectation counts as overpacing.
const OVERPACING_RATIO: f64 = 1.15;
const UNDERPACING_RATIO: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacingStatus {
    OnTrack,
    Overpacing,
    Underpacing,
    Overspent,
    NoBudget,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPacing {
    pub monthly_budget_micros: i64,
    pub spend_micros: i64,
    pub expected_spend_micros: i64,
    pub projected_spend_micros: i64,
    /// spend / expected; 0 when nothing was expected yet.
    pub pacing_ratio: f64,
    pub day_of_month: u32,
    pub days_in_month: u32,
    pub status: PacingStatus,
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

/// Month-to-date pacing for a campaign with the given daily budget.
pub fn budget_pacing(daily_budget_micros: i64, spend_micros: i64, today: NaiveDate) -> BudgetPacing {
    let days = days_in_month(today);
    let day = today.day();
    pacing_for_monthly(daily_budget_micros * days as i64, spend_micros, day, days)
}

pub fn pacing_for_monthly(
    monthly_budget_micros: i64,
    spend_micros: i64,
    day_of_month: u32,
    days_in_month: u32,
) -> BudgetPacing {
    let day = day_of_month.clamp(1, days_in_month.max(1));
    let days = days_in_month.max(1);

    let expected = monthly_budget_micros as f64 * day as f64 / days as f64;
    let projected = spend_micros as f64 / day as f64 * days as f64;
    let ratio = if expected > 0.0 {
        spend_micros as f64 / expected
    } else {
        0.0
    };

    let status = if monthly_budget_micros <= 0 {
        PacingStatus::NoBudget
    } else if spend_micros >= monthly_budget_micros {
        PacingStatus::Overspent
    } else if ratio > OVERPACING_RATIO {
        PacingStatus::Overpacing
    } else if ratio < UNDERPACING_RATIO {
        PacingStatus::Underpacing
    } else {
        PacingStatus::OnTrack
    };

    BudgetPacing {
        monthly_budget_micros,
        spend_micros,
        expected_spend_micros: expected.round() as i64,
        projected_spend_micros: projected.round() as i64,
        pacing_ratio: ratio,
        day_of_month: day,
        days_in_month: days,
        status,
    }
}
