// The infra module contains implementations of core traits.
// Each external system gets its own submodule.

#[path = "google_ads/mod.rs"]
pub mod google_ads;

#[path = "storage/mod.rs"]
pub mod storage;

#[path = "ai/mod.rs"]
pub mod ai;
