/// Service history endpoints
///
/// - `GET    /v1/customers/:id/history` - Visits, most recently recorded first
/// - `POST   /v1/customers/:id/history` - Record a visit; it becomes the current visit
/// - `DELETE /v1/customers/:id/history/:history_id` - Remove a visit and resync the current visit

use super::customers::{owned_customer, parse_visit};
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::models::service_history::ServiceHistory;
use rebook_shared::models::visit::CurrentVisit;
use rebook_shared::retention::history::{record_visit, remove_visit, NewVisit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddVisitRequest {
    /// Services received, primary first
    pub services: Vec<String>,

    /// `YYYY-MM-DD` or RFC 3339
    pub date: String,

    /// Free text, e.g. "1200" or "₹1,200"
    #[validate(length(max = 50, message = "Price must be at most 50 characters"))]
    pub price: Option<String>,

    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemoveVisitResponse {
    /// The customer's current visit after the delete
    pub current_visit: Option<CurrentVisit>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ServiceHistory>>> {
    owned_customer(&state, &auth, customer_id).await?;

    let history = state.store.list_service_history(customer_id).await?;
    Ok(Json(history))
}

pub async fn add_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(customer_id): Path<Uuid>,
    Json(req): Json<AddVisitRequest>,
) -> ApiResult<(StatusCode, Json<ServiceHistory>)> {
    req.validate()?;
    let customer = owned_customer(&state, &auth, customer_id).await?;
    let (services, visited_at) = parse_visit(req.services, "date", &req.date)?;

    let entry = record_visit(
        state.store.as_ref(),
        &customer,
        NewVisit {
            services,
            visited_at,
            price: non_blank(req.price),
            notes: non_blank(req.notes),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn delete_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((customer_id, history_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RemoveVisitResponse>> {
    let customer = owned_customer(&state, &auth, customer_id).await?;
    let current_visit = remove_visit(state.store.as_ref(), &customer, history_id).await?;

    Ok(Json(RemoveVisitResponse { current_visit }))
}
