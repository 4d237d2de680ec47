/// Reminder dispatch endpoint
///
/// ```text
/// POST /send-reminder
/// Content-Type: application/json
///
/// { "campaignId": "…", "salonId": "…" }
/// ```
///
/// No bearer token is required; the campaign must belong to `salonId`.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Sent 2 of 3 reminders",
///   "total": 3,
///   "sent": 2,
///   "failed": 1,
///   "ranAt": "2025-06-01T18:00:00Z",
///   "results": [
///     { "customerId": "…", "name": "Asha", "phone": "9876543210", "success": true }
///   ]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing ids, or the salon has no WhatsApp credentials
/// - `403 Forbidden`: Campaign belongs to another salon
/// - `404 Not Found`: Campaign, template or salon missing
/// - `500 Internal Server Error`: Store failure

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use rebook_shared::retention::dispatch::DispatchReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReminderRequest {
    pub campaign_id: Option<String>,
    pub salon_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendReminderResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: DispatchReport,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn send_reminder(
    State(state): State<AppState>,
    Json(req): Json<SendReminderRequest>,
) -> ApiResult<Json<SendReminderResponse>> {
    let (Some(campaign_id), Some(salon_id)) = (required(req.campaign_id), required(req.salon_id))
    else {
        return Err(ApiError::BadRequest(
            "Campaign ID and Salon ID are required".to_string(),
        ));
    };

    // A malformed id cannot name an existing campaign
    let campaign_id = Uuid::parse_str(&campaign_id)
        .map_err(|_| ApiError::NotFound("Campaign not found".to_string()))?;

    let report = state.dispatcher.run(campaign_id, &salon_id).await?;

    Ok(Json(SendReminderResponse {
        success: true,
        report,
    }))
}
