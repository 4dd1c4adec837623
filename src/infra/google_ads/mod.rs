pub mod gaql_rows;
pub mod google_ads_client;
pub mod oauth_client;

pub use google_ads_client::GoogleAdsClient;
pub use oauth_client::{GoogleOAuthClient, GOOGLE_TOKEN_URL};
