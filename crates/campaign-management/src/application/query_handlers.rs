//! Query handlers for the Campaign Management context.
//!
//! This module contains query handlers that rebuild campaigns through the
//! repository and return read-only view DTOs.

use campaign_core::error::DomainError;
use serde::Serialize;
use tracing::instrument;

use crate::domain::aggregates::Campaign;
use crate::domain::business_type::BusinessType;
use crate::domain::campaign_id::CampaignId;
use crate::persistence::repository::CampaignRepository;

/// Read-only view of a campaign aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignView {
    /// The campaign identifier.
    pub campaign_id: CampaignId,
    /// Display name.
    pub name: String,
    /// Current business type.
    pub business_type: BusinessType,
}

impl From<&Campaign> for CampaignView {
    fn from(campaign: &Campaign) -> Self {
        Self {
            campaign_id: campaign.id().clone(),
            name: campaign.name().to_owned(),
            business_type: campaign.business_type(),
        }
    }
}

/// Retrieves a campaign by its identifier.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the campaign has no stream.
/// Returns `DomainError::PersistenceFailure` if the store fails.
#[instrument(skip(repo), fields(campaign_id = %campaign_id))]
pub async fn get_campaign_by_id(
    campaign_id: &CampaignId,
    repo: &dyn CampaignRepository,
) -> Result<CampaignView, DomainError> {
    let campaign = repo
        .load(campaign_id)
        .await?
        .ok_or_else(|| DomainError::AggregateNotFound(campaign_id.to_string()))?;
    Ok(CampaignView::from(&campaign))
}
