/// Salon settings endpoints
///
/// - `GET /v1/salon` - Profile and WhatsApp status
/// - `PUT /v1/salon` - Display name and contact email
/// - `PUT /v1/salon/whatsapp` - WhatsApp Business credentials
///
/// The access token is write-only; responses only say whether one is set.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::models::salon::{Salon, UpdateSalon};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct SalonView {
    pub id: String,
    pub salon_name: Option<String>,
    pub email: String,
    pub whatsapp_configured: bool,
    pub whatsapp_phone_number_id: Option<String>,
    pub whatsapp_business_id: Option<String>,
}

impl From<Salon> for SalonView {
    fn from(salon: Salon) -> Self {
        Self {
            whatsapp_configured: salon.whatsapp_credentials().is_some(),
            id: salon.id,
            salon_name: salon.salon_name,
            email: salon.email,
            whatsapp_phone_number_id: non_blank(salon.whatsapp_phone_number_id),
            whatsapp_business_id: non_blank(salon.whatsapp_business_id),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSalonRequest {
    #[validate(length(min = 2, max = 100, message = "Salon name must be 2 to 100 characters"))]
    pub salon_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WhatsAppSettingsRequest {
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,

    #[validate(length(min = 1, message = "Phone number ID is required"))]
    pub phone_number_id: String,

    /// Omitting it clears a previously saved id
    pub business_id: Option<String>,
}

fn salon_not_found() -> ApiError {
    ApiError::NotFound("Salon not found".to_string())
}

pub async fn get_salon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<SalonView>> {
    let salon = state
        .store
        .get_salon(&auth.salon_id)
        .await?
        .ok_or_else(salon_not_found)?;

    Ok(Json(salon.into()))
}

pub async fn update_salon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateSalonRequest>,
) -> ApiResult<Json<SalonView>> {
    req.validate()?;

    let salon = state
        .store
        .update_salon(
            &auth.salon_id,
            UpdateSalon {
                salon_name: req.salon_name.map(|n| n.trim().to_string()),
                email: req.email,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(salon_not_found)?;

    tracing::info!(salon_id = %salon.id, "Salon profile updated");
    Ok(Json(salon.into()))
}

pub async fn save_whatsapp(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<WhatsAppSettingsRequest>,
) -> ApiResult<Json<SalonView>> {
    req.validate()?;

    let salon = state
        .store
        .update_salon(
            &auth.salon_id,
            UpdateSalon {
                whatsapp_access_token: Some(req.access_token.trim().to_string()),
                whatsapp_phone_number_id: Some(req.phone_number_id.trim().to_string()),
                whatsapp_business_id: Some(
                    req.business_id.map(|b| b.trim().to_string()).unwrap_or_default(),
                ),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(salon_not_found)?;

    tracing::info!(salon_id = %salon.id, "WhatsApp settings saved");
    Ok(Json(salon.into()))
}
