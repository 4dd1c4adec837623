// Shared state handed to every handler.
// Services are trait-object backed so the same router runs against sqlite or
// memory stores, the real Google Ads client or the test fake.

use std::sync::Arc;

use crate::core::ai::AiProvider;
use crate::core::credentials::{CredentialResolver, CredentialStore, TokenProvider};
use crate::core::google_ads::{open_session, AdsSession, GoogleAdsApi, SessionError};
use crate::core::hierarchy::{HierarchyStore, ManagerResolver};
use crate::core::insights::InsightService;
use crate::core::optimization::OptimizationExecutor;

pub type Credentials = CredentialResolver<Box<dyn CredentialStore>, Arc<dyn TokenProvider>>;
pub type Managers = ManagerResolver<Arc<dyn GoogleAdsApi>, Box<dyn HierarchyStore>>;
pub type Executor = OptimizationExecutor<Arc<dyn GoogleAdsApi>>;
pub type Insights = InsightService<Box<dyn AiProvider>>;

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<Credentials>,
    pub managers: Arc<Managers>,
    pub ads: Arc<dyn GoogleAdsApi>,
    pub executor: Arc<Executor>,
    pub insights: Arc<Insights>,
    /// HS256 secret the auth backend signs session tokens with.
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(
        credentials: Credentials,
        ads: Arc<dyn GoogleAdsApi>,
        hierarchy_store: Box<dyn HierarchyStore>,
        persist_hierarchy: bool,
        insights: Insights,
        jwt_secret: &str,
    ) -> Self {
        let mut managers = ManagerResolver::new(Arc::clone(&ads), hierarchy_store);
        if !persist_hierarchy {
            managers = managers.without_persistence();
        }

        Self {
            credentials: Arc::new(credentials),
            managers: Arc::new(managers),
            executor: Arc::new(OptimizationExecutor::new(Arc::clone(&ads))),
            ads,
            insights: Arc::new(insights),
            jwt_secret: Arc::from(jwt_secret),
        }
    }

    pub async fn session(
        &self,
        user_id: &str,
        customer_id: Option<&str>,
    ) -> Result<AdsSession, SessionError> {
        open_session(&self.credentials, &self.managers, user_id, customer_id).await
    }
}
