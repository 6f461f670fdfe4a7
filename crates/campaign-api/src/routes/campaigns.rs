//! Routes for the Campaign Management bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use campaign_management::application::query_handlers::{self, CampaignView};
use campaign_management::application::command_handlers;
use campaign_management::domain::business_type::BusinessType;
use campaign_management::domain::campaign_id::CampaignId;
use campaign_management::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    /// Identity of the new campaign.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Initial business type. Defaults to `STANDARD`.
    #[serde(default)]
    pub business_type: BusinessType,
}

/// Request body for POST /{id}/change-business-type.
#[derive(Debug, Deserialize)]
pub struct ChangeBusinessTypeRequest {
    /// The business type to switch to.
    pub business_type: BusinessType,
}

/// POST /
#[instrument(skip(state, request), fields(campaign_id = %request.id))]
async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignView>), ApiError> {
    let command = commands::CreateCampaign {
        correlation_id: Uuid::new_v4(),
        campaign_id: CampaignId::new(request.id),
        name: request.name,
        business_type: request.business_type,
    };

    info!(correlation_id = %command.correlation_id, "handling create_campaign command");

    let view =
        command_handlers::handle_create_campaign(&command, &*state.campaign_repository).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CampaignView>, ApiError> {
    let view =
        query_handlers::get_campaign_by_id(&CampaignId::new(id), &*state.campaign_repository)
            .await?;

    Ok(Json(view))
}

/// POST /{id}/change-business-type
#[instrument(skip(state, request))]
async fn change_business_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChangeBusinessTypeRequest>,
) -> Result<Json<CampaignView>, ApiError> {
    let command = commands::ChangeBusinessType {
        correlation_id: Uuid::new_v4(),
        campaign_id: CampaignId::new(id),
        business_type: request.business_type,
    };

    info!(correlation_id = %command.correlation_id, "handling change_business_type command");

    let view = command_handlers::handle_change_business_type(
        &command,
        state.clock.as_ref(),
        &*state.campaign_repository,
    )
    .await?;

    Ok(Json(view))
}

/// Returns the router for the campaign context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_campaign))
        .route("/{id}", get(get_campaign))
        .route("/{id}/change-business-type", post(change_business_type))
}
