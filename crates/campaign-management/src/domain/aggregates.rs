//! Aggregate roots for the Campaign Management context.

use campaign_core::clock::Clock;
use campaign_core::emitter::{EventEmitter, Observers};
use campaign_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::business_type::BusinessType;
use super::campaign_id::CampaignId;
use super::events::{
    CampaignBusinessTypeChanged, CampaignCreated, CampaignEvent, CampaignEventKind,
};

/// Plain field values of a campaign, used to rehydrate one without
/// re-emitting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignState {
    /// Aggregate identifier.
    pub id: CampaignId,
    /// Display name.
    pub name: String,
    /// Current business type.
    pub business_type: BusinessType,
}

/// The aggregate root for a marketing campaign.
///
/// Every state change is published through the campaign's observer list.
/// The aggregate keeps no record of its own pending events.
#[derive(Debug)]
pub struct Campaign {
    id: CampaignId,
    name: String,
    business_type: BusinessType,
    observers: Observers<CampaignEvent>,
}

impl Campaign {
    /// Creates a new campaign, emitting `CampaignCreated`.
    ///
    /// Nobody is listening yet, so the event is only observable through
    /// [`Campaign::create_observed`].
    #[must_use]
    pub fn create(
        id: CampaignId,
        name: impl Into<String>,
        business_type: BusinessType,
        clock: &dyn Clock,
    ) -> Self {
        Self::create_observed(id, name, business_type, clock, Observers::new())
    }

    /// Creates a new campaign wired to `observers`, which receive the
    /// `CampaignCreated` event.
    #[must_use]
    pub fn create_observed(
        id: CampaignId,
        name: impl Into<String>,
        business_type: BusinessType,
        clock: &dyn Clock,
        observers: Observers<CampaignEvent>,
    ) -> Self {
        let campaign = Self {
            id,
            name: name.into(),
            business_type,
            observers,
        };
        campaign.emit(
            CampaignEventKind::CampaignCreated(CampaignCreated {
                campaign_id: campaign.id.clone(),
                name: campaign.name.clone(),
                business_type: campaign.business_type,
            }),
            clock,
        );
        campaign
    }

    /// Rehydrates a campaign from folded state. Emits nothing.
    #[must_use]
    pub fn from_state(state: CampaignState) -> Self {
        Self {
            id: state.id,
            name: state.name,
            business_type: state.business_type,
            observers: Observers::new(),
        }
    }

    /// Switches the campaign to `new_type`, emitting
    /// `CampaignBusinessTypeChanged`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `new_type` equals the current
    /// business type. Nothing is emitted in that case.
    pub fn change_business_type(
        &mut self,
        new_type: BusinessType,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if new_type == self.business_type {
            return Err(DomainError::Validation(
                "new business type must be different from current type".to_owned(),
            ));
        }

        let old_type = self.business_type;
        self.business_type = new_type;
        self.emit(
            CampaignEventKind::CampaignBusinessTypeChanged(CampaignBusinessTypeChanged {
                campaign_id: self.id.clone(),
                old_type,
                new_type,
            }),
            clock,
        );
        Ok(())
    }

    /// The campaign identifier.
    #[must_use]
    pub fn id(&self) -> &CampaignId {
        &self.id
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current business type.
    #[must_use]
    pub fn business_type(&self) -> BusinessType {
        self.business_type
    }

    /// A copy of the campaign's field values.
    #[must_use]
    pub fn state(&self) -> CampaignState {
        CampaignState {
            id: self.id.clone(),
            name: self.name.clone(),
            business_type: self.business_type,
        }
    }

    fn emit(&self, kind: CampaignEventKind, clock: &dyn Clock) {
        self.observers.emit(&CampaignEvent {
            occurred_at: clock.now(),
            kind,
        });
    }
}

impl EventEmitter for Campaign {
    type Event = CampaignEvent;

    fn observers(&self) -> &Observers<CampaignEvent> {
        &self.observers
    }

    fn observers_mut(&mut self) -> &mut Observers<CampaignEvent> {
        &mut self.observers
    }
}
