/// Campaign endpoints
///
/// - `GET    /v1/campaigns`
/// - `POST   /v1/campaigns`
/// - `GET    /v1/campaigns/:id`
/// - `PUT    /v1/campaigns/:id`
/// - `DELETE /v1/campaigns/:id`
/// - `GET    /v1/campaigns/:id/due` - Customers the campaign would message now
/// - `POST   /v1/campaigns/:id/send` - Dispatch the campaign

use super::customers::CustomerView;
use super::ensure_owner;
use super::templates::owned_template;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rebook_shared::auth::context::AuthContext;
use rebook_shared::models::campaign::{Campaign, NewCampaign, UpdateCampaign};
use rebook_shared::retention::dispatch::DispatchReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,

    pub template_id: Uuid,

    /// Primary service to target; empty or absent targets everyone
    pub service_filter: Option<String>,

    #[validate(range(min = 1, max = 365, message = "Days since visit must be between 1 and 365"))]
    pub days_since_visit: i32,

    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: Option<String>,

    pub template_id: Option<Uuid>,

    /// An empty string clears the filter
    pub service_filter: Option<String>,

    #[validate(range(min = 1, max = 365, message = "Days since visit must be between 1 and 365"))]
    pub days_since_visit: Option<i32>,

    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DueCustomersResponse {
    pub count: usize,
    pub customers: Vec<CustomerView>,
}

async fn owned_campaign(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Campaign> {
    let campaign = state
        .store
        .get_campaign(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

    ensure_owner(auth, &campaign.salon_id, "campaign")?;
    Ok(campaign)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

pub async fn list_campaigns(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Campaign>>> {
    Ok(Json(state.store.list_campaigns(&auth.salon_id).await?))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    req.validate()?;
    owned_template(&state, &auth, req.template_id).await?;

    let campaign = state
        .store
        .add_campaign(NewCampaign {
            salon_id: auth.salon_id.clone(),
            name: req.name.trim().to_string(),
            template_id: req.template_id,
            service_filter: trimmed(req.service_filter).filter(|f| !f.is_empty()),
            days_since_visit: req.days_since_visit,
            active: req.active,
        })
        .await?;

    tracing::info!(campaign_id = %campaign.id, salon_id = %auth.salon_id, "Campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(owned_campaign(&state, &auth, id).await?))
}

pub async fn update_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> ApiResult<Json<Campaign>> {
    req.validate()?;
    owned_campaign(&state, &auth, id).await?;
    if let Some(template_id) = req.template_id {
        owned_template(&state, &auth, template_id).await?;
    }

    let campaign = state
        .store
        .update_campaign(
            id,
            UpdateCampaign {
                name: trimmed(req.name),
                template_id: req.template_id,
                service_filter: trimmed(req.service_filter),
                days_since_visit: req.days_since_visit,
                active: req.active,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Campaign not found".to_string()))?;

    Ok(Json(campaign))
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_campaign(&state, &auth, id).await?;

    if !state.store.delete_campaign(id).await? {
        return Err(ApiError::NotFound("Campaign not found".to_string()));
    }

    tracing::info!(campaign_id = %id, "Campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn due_customers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DueCustomersResponse>> {
    let now = Utc::now();
    let due = state.dispatcher.preview(id, &auth.salon_id, now).await?;

    Ok(Json(DueCustomersResponse {
        count: due.len(),
        customers: due.into_iter().map(|c| CustomerView::new(c, now)).collect(),
    }))
}

/// Same validation and behavior as `POST /send-reminder`, scoped to the
/// caller's salon
pub async fn send_campaign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DispatchReport>> {
    let report = state.dispatcher.run(id, &auth.salon_id).await?;
    Ok(Json(report))
}
