use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::Investigator;
use crate::pagination::{PageParams, Paginated};
use crate::repository::InvestigatorRepository;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Substring search over first or last name.
    pub name: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvestigatorPayload {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
}

/// GET /investigadores - paginated listing, optionally filtered by name.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Investigator>>, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let repo = InvestigatorRepository::new(state.pool.clone());

    let (investigators, total) = match query.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => repo.search(name, params.limit, params.offset()).await?,
        None => repo.list(params.limit, params.offset()).await?,
    };

    Ok(Json(Paginated::new(investigators, total, params)))
}

/// GET /investigadores/all - full listing for selection widgets.
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let repo = InvestigatorRepository::new(state.pool.clone());
    let investigators = repo.list_all().await?;
    Ok(Json(json!({ "data": investigators })))
}

/// GET /investigadores/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Investigator>, ApiError> {
    let repo = InvestigatorRepository::new(state.pool.clone());
    let investigator = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Investigador not found"))?;
    Ok(Json(investigator))
}

/// POST /investigadores
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<InvestigatorPayload>,
) -> Result<(StatusCode, Json<Investigator>), ApiError> {
    if payload.first_name.is_empty() || payload.last_name.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields: nombre and apellido",
        ));
    }

    let repo = InvestigatorRepository::new(state.pool.clone());
    let investigator = repo.create(&payload.first_name, &payload.last_name).await?;
    Ok((StatusCode::CREATED, Json(investigator)))
}

/// PUT /investigadores/:id - full overwrite of the name fields.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<InvestigatorPayload>,
) -> Result<Json<Investigator>, ApiError> {
    if payload.first_name.is_empty() || payload.last_name.is_empty() {
        return Err(ApiError::validation_error(
            "Missing required fields: nombre and apellido",
        ));
    }

    let repo = InvestigatorRepository::new(state.pool.clone());
    let investigator = repo
        .update(id, &payload.first_name, &payload.last_name)
        .await?
        .ok_or_else(|| ApiError::not_found("Investigador not found"))?;
    Ok(Json(investigator))
}

/// DELETE /investigadores/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let repo = InvestigatorRepository::new(state.pool.clone());
    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
