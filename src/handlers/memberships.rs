use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::{Membership, NewMembership};
use crate::pagination::{PageParams, Paginated};
use crate::repository::MembershipRepository;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// GET /detalles - paginated listing of every link row.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Membership>>, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let repo = MembershipRepository::new(state.pool.clone());
    let (memberships, total) = repo.list(params.limit, params.offset()).await?;
    Ok(Json(Paginated::new(memberships, total, params)))
}

/// GET /detalles/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Membership>, ApiError> {
    let repo = MembershipRepository::new(state.pool.clone());
    let membership = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Detalle not found"))?;
    Ok(Json(membership))
}

/// GET /grupos/:id/detalles - link rows of one group.
pub async fn list_by_group(
    State(state): State<AppState>,
    Path(group_id): Path<i32>,
) -> Result<Json<Vec<Membership>>, ApiError> {
    let repo = MembershipRepository::new(state.pool.clone());
    let memberships = repo.list_by_group(group_id).await?;
    Ok(Json(memberships))
}

/// POST /detalles
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<NewMembership>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    if payload.role.is_empty() {
        return Err(ApiError::validation_error("Missing required field: rol"));
    }

    let repo = MembershipRepository::new(state.pool.clone());
    let membership = repo.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// PUT /detalles/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NewMembership>,
) -> Result<Json<Membership>, ApiError> {
    let repo = MembershipRepository::new(state.pool.clone());
    let membership = repo
        .update(id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Detalle not found"))?;
    Ok(Json(membership))
}

/// DELETE /detalles/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let repo = MembershipRepository::new(state.pool.clone());
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
