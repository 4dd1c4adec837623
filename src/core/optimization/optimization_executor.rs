use crate::core::google_ads::{
    require_numeric_id, AdsAuth, AdsError, CampaignStatus, GoogleAdsApi,
};

use super::optimization_models::{
    reduced_budget_micros, BatchSummary, OptimizationAction, OptimizationResult,
};

/// Pushes confirmed optimization actions to Google Ads.
pub struct OptimizationExecutor<A: GoogleAdsApi> {
    ads: A,
}

impl<A: GoogleAdsApi> OptimizationExecutor<A> {
    pub fn new(ads: A) -> Self {
        Self { ads }
    }

    /// Apply every action in order. One failure doesn't stop the rest, and
    /// there is exactly one result per action.
    pub async fn apply_batch(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        actions: Vec<OptimizationAction>,
    ) -> BatchSummary {
        let mut results = Vec::with_capacity(actions.len());

        for (index, action) in actions.into_iter().enumerate() {
            let outcome = self.apply_one(auth, customer_id, &action).await;
            let result = match outcome {
                Ok(resource_name) => OptimizationResult {
                    index,
                    action,
                    success: true,
                    error: None,
                    resource_name: Some(resource_name),
                },
                Err(e) => {
                    tracing::error!(
                        customer_id,
                        index,
                        action = action.label(),
                        "Optimization failed: {}",
                        e
                    );
                    OptimizationResult {
                        index,
                        action,
                        success: false,
                        error: Some(e.to_string()),
                        resource_name: None,
                    }
                }
            };
            results.push(result);
        }

        let summary = BatchSummary::from_results(results);
        tracing::info!(
            customer_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Applied optimization batch"
        );
        summary
    }

    async fn apply_one(
        &self,
        auth: &AdsAuth,
        customer_id: &str,
        action: &OptimizationAction,
    ) -> Result<String, AdsError> {
        match action {
            OptimizationAction::PauseCampaign { campaign_id } => {
                require_numeric_id("campaignId", campaign_id)?;
                self.ads
                    .set_campaign_status(auth, customer_id, campaign_id, CampaignStatus::Paused)
                    .await
            }
            OptimizationAction::AddNegativeKeyword {
                campaign_id,
                keyword,
                match_type,
            } => {
                require_numeric_id("campaignId", campaign_id)?;
                if keyword.trim().is_empty() {
                    return Err(AdsError::InvalidRequest("keyword must not be empty".to_string()));
                }
                let created = self
                    .ads
                    .add_negative_keywords(
                        auth,
                        customer_id,
                        campaign_id,
                        std::slice::from_ref(keyword),
                        *match_type,
                    )
                    .await?;
                created.into_iter().next().ok_or_else(|| {
                    AdsError::InvalidResponse("no criterion created".to_string())
                })
            }
            OptimizationAction::AdjustBid {
                ad_group_id,
                criterion_id,
                cpc_bid_micros,
            } => {
                require_numeric_id("adGroupId", ad_group_id)?;
                require_numeric_id("criterionId", criterion_id)?;
                if *cpc_bid_micros <= 0 {
                    return Err(AdsError::InvalidRequest(
                        "bid must be positive".to_string(),
                    ));
                }
                self.ads
                    .update_keyword_bid(auth, customer_id, ad_group_id, criterion_id, *cpc_bid_micros)
                    .await
            }
            OptimizationAction::ReduceBudget {
                campaign_id,
                budget_id,
                current_amount_micros,
                percent,
            } => {
                let budget_id = budget_id.as_deref().ok_or_else(|| {
                    AdsError::InvalidRequest(format!("campaign {} has no budget id", campaign_id))
                })?;
                require_numeric_id("budgetId", budget_id)?;
                let amount = reduced_budget_micros(*current_amount_micros, *percent).ok_or_else(
                    || {
                        AdsError::InvalidRequest(format!(
                            "budget of campaign {} is already at the minimum",
                            campaign_id
                        ))
                    },
                )?;
                self.ads
                    .update_campaign_budget(auth, customer_id, budget_id, amount)
                    .await
            }
        }
    }
}
