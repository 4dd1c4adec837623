pub mod optimization_executor;
pub mod optimization_models;

pub use optimization_executor::OptimizationExecutor;
pub use optimization_models::{
    reduced_budget_micros, BatchSummary, OptimizationAction, OptimizationResult,
};
