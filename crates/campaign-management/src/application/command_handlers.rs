//! Command handlers for the Campaign Management context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load the aggregate through the repository,
//! execute the command, save.

use campaign_core::clock::Clock;
use campaign_core::command::Command;
use campaign_core::error::DomainError;
use tracing::{info, instrument};

use crate::application::query_handlers::CampaignView;
use crate::domain::commands::{ChangeBusinessType, CreateCampaign};
use crate::persistence::repository::CampaignRepository;

/// Handles the `CreateCampaign` command: validates the input and creates
/// the campaign through the repository.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id or name is blank,
/// `DomainError::AlreadyExists` if the campaign already exists, or
/// `DomainError::PersistenceFailure` if the store fails.
#[instrument(skip(command, repo), fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id(),
    campaign_id = %command.campaign_id
))]
pub async fn handle_create_campaign(
    command: &CreateCampaign,
    repo: &dyn CampaignRepository,
) -> Result<CampaignView, DomainError> {
    if command.campaign_id.as_str().trim().is_empty() {
        return Err(DomainError::Validation(
            "campaign id must not be blank".to_owned(),
        ));
    }
    if command.name.trim().is_empty() {
        return Err(DomainError::Validation(
            "campaign name must not be blank".to_owned(),
        ));
    }

    let campaign = repo
        .create_campaign(
            command.campaign_id.clone(),
            command.name.clone(),
            command.business_type,
        )
        .await?;

    info!(business_type = %campaign.business_type(), "campaign created");
    Ok(CampaignView::from(&campaign))
}

/// Handles the `ChangeBusinessType` command: loads the campaign, switches
/// its business type, and saves the resulting event.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the campaign does not exist,
/// `DomainError::Validation` if the type is unchanged,
/// `DomainError::ConcurrencyConflict` if another writer got there first, or
/// `DomainError::PersistenceFailure` if the store fails.
#[instrument(skip(command, clock, repo), fields(
    command_type = command.command_type(),
    correlation_id = %command.correlation_id(),
    campaign_id = %command.campaign_id
))]
pub async fn handle_change_business_type(
    command: &ChangeBusinessType,
    clock: &dyn Clock,
    repo: &dyn CampaignRepository,
) -> Result<CampaignView, DomainError> {
    let mut campaign = repo
        .load(&command.campaign_id)
        .await?
        .ok_or_else(|| DomainError::AggregateNotFound(command.campaign_id.to_string()))?;

    campaign.change_business_type(command.business_type, clock)?;
    repo.save(&campaign).await?;

    info!(business_type = %command.business_type, "business type changed");
    Ok(CampaignView::from(&campaign))
}
