//! Commands for the Campaign Management context.

use campaign_core::command::Command;
use uuid::Uuid;

use super::business_type::BusinessType;
use super::campaign_id::CampaignId;

/// Command to create a new campaign.
#[derive(Debug, Clone)]
pub struct CreateCampaign {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identity for the new campaign.
    pub campaign_id: CampaignId,
    /// Display name.
    pub name: String,
    /// Initial business type.
    pub business_type: BusinessType,
}

impl Command for CreateCampaign {
    fn command_type(&self) -> &'static str {
        "campaign.create_campaign"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to switch a campaign to a different business type.
#[derive(Debug, Clone)]
pub struct ChangeBusinessType {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The campaign to change.
    pub campaign_id: CampaignId,
    /// The business type to switch to.
    pub business_type: BusinessType,
}

impl Command for ChangeBusinessType {
    fn command_type(&self) -> &'static str {
        "campaign.change_business_type"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
