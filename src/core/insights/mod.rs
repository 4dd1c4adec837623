pub mod insight_service;

pub use insight_service::{InsightError, InsightKind, InsightReport, InsightService};
