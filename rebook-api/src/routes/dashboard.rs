/// `GET /v1/dashboard/stats`

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use rebook_shared::auth::context::AuthContext;
use rebook_shared::retention::stats::DashboardStats;

pub async fn stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardStats>> {
    let (customers, campaigns) = tokio::try_join!(
        state.store.list_all_customers(&auth.salon_id),
        state.store.list_campaigns(&auth.salon_id),
    )?;

    Ok(Json(DashboardStats::compute(&customers, &campaigns, Utc::now())))
}
