/// Message template endpoints
///
/// - `GET    /v1/templates`
/// - `POST   /v1/templates`
/// - `GET    /v1/templates/:id`
/// - `PUT    /v1/templates/:id`
/// - `DELETE /v1/templates/:id`
///
/// `variables` is always derived from the content and cannot be set.

use super::ensure_owner;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rebook_shared::auth::context::AuthContext;
use rebook_shared::models::template::{NewTemplate, Template, UpdateTemplate};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTemplateRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,

    #[validate(length(min = 10, max = 1000, message = "Content must be 10 to 1000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 10, max = 1000, message = "Content must be 10 to 1000 characters"))]
    pub content: Option<String>,
}

pub(crate) async fn owned_template(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
) -> ApiResult<Template> {
    let template = state
        .store
        .get_template(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    ensure_owner(auth, &template.salon_id, "template")?;
    Ok(template)
}

pub async fn list_templates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Template>>> {
    Ok(Json(state.store.list_templates(&auth.salon_id).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTemplateRequest>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    req.validate()?;

    let template = state
        .store
        .add_template(NewTemplate {
            salon_id: auth.salon_id.clone(),
            name: req.name.trim().to_string(),
            content: req.content,
        })
        .await?;

    tracing::info!(
        template_id = %template.id,
        variables = template.variables.len(),
        "Template created"
    );
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Template>> {
    Ok(Json(owned_template(&state, &auth, id).await?))
}

pub async fn update_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> ApiResult<Json<Template>> {
    req.validate()?;
    owned_template(&state, &auth, id).await?;

    let template = state
        .store
        .update_template(
            id,
            UpdateTemplate {
                name: req.name.map(|n| n.trim().to_string()),
                content: req.content,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(Json(template))
}

/// Campaigns still pointing at the template fail at send time with 404
pub async fn delete_template(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_template(&state, &auth, id).await?;

    if !state.store.delete_template(id).await? {
        return Err(ApiError::NotFound("Template not found".to_string()));
    }

    tracing::info!(template_id = %id, "Template deleted");
    Ok(StatusCode::NO_CONTENT)
}
