// Heuristic analyzers. All pure functions over fetched snapshots.

pub mod budget_pacing;
pub mod custom_rules;
pub mod health_score;
pub mod performance_flags;
pub mod search_terms;

pub use budget_pacing::{budget_pacing, BudgetPacing, PacingStatus};
pub use custom_rules::{evaluate_rules, CustomRule, RuleMatch};
pub use health_score::{health_score, AccountSnapshot, HealthScore};
pub use performance_flags::{performance_flags, PerformanceFlag};
pub use search_terms::{negative_keyword_candidates, NegativeKeywordCriteria};
