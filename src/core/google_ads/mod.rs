pub mod ads_api;
pub mod ads_models;
pub mod ads_session;

#[cfg(test)]
pub mod fake_ads_api;

pub use ads_api::{AdsError, GoogleAdsApi};
pub use ads_models::{
    normalize_customer_id, require_numeric_id, AdGroupSnapshot, AdSnapshot, AdsAuth, CampaignSnapshot,
    CampaignStatus, ClientAccount, CreatedCampaign, CustomerInfo, DateRange, KeywordMatchType,
    KeywordSnapshot, Metrics, NewCampaign, SearchTermSnapshot,
};
pub use ads_session::{open_session, AdsSession, SessionError};
