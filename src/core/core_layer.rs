// The core module contains all business logic.
// Each feature gets its own submodule. Nothing in here knows about HTTP or SQL;
// external systems come in through the traits each feature defines.

#[path = "credentials/mod.rs"]
pub mod credentials;

#[path = "google_ads/mod.rs"]
pub mod google_ads;

#[path = "hierarchy/mod.rs"]
pub mod hierarchy;

#[path = "analysis/mod.rs"]
pub mod analysis;

#[path = "optimization/mod.rs"]
pub mod optimization;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "insights/mod.rs"]
pub mod insights;
