//! Shared application state.

use std::sync::Arc;

use campaign_core::clock::Clock;
use campaign_management::persistence::repository::CampaignRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock used to timestamp domain events.
    pub clock: Arc<dyn Clock>,
    /// Repository for campaign aggregates.
    pub campaign_repository: Arc<dyn CampaignRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, campaign_repository: Arc<dyn CampaignRepository>) -> Self {
        Self {
            clock,
            campaign_repository,
        }
    }
}
