//! Group endpoints, including the multipart create/update flows that pair a
//! database row with a stored attachment. File and row changes are ordered so
//! a failure never leaves the database pointing at a missing file: new files
//! are stored before the row is written and removed again if the write fails;
//! old files are only removed after the row change succeeded.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::models::{Group, GroupWithInvestigators, InvestigatorGroup, NewGroup};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{GroupFilters, GroupRepository, MemberSpec};
use crate::state::AppState;
use crate::storage::{public_reference, AttachmentStore};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Deserialize)]
pub struct GroupSearchQuery {
    /// Substring on the group name.
    pub grupo: Option<String>,
    /// Substring on an investigator's full name.
    pub investigador: Option<String>,
    /// Exact registration year.
    #[serde(rename = "año")]
    pub year: Option<String>,
    #[serde(rename = "lineaInvestigacion")]
    pub research_line: Option<String>,
    #[serde(rename = "tipoInvestigacion")]
    pub research_type: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl GroupSearchQuery {
    /// Map raw query values onto repository filters. Empty strings count as
    /// absent; a non-numeric year is rejected rather than silently ignored.
    fn filters(&self) -> Result<GroupFilters, ApiError> {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
        }

        let year = match self.year.as_deref().filter(|y| !y.is_empty()) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                ApiError::validation_error("Invalid value for año: expected a year number")
            })?),
            None => None,
        };

        Ok(GroupFilters {
            name: present(&self.grupo),
            investigator: present(&self.investigador),
            year,
            research_line: present(&self.research_line),
            research_type: present(&self.research_type),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupWithMembers {
    #[serde(rename = "grupo")]
    pub group: NewGroup,
    #[serde(rename = "investigadores", default)]
    pub members: Vec<MemberSpec>,
}

/// Replace the stored attachment identifier with its public URL. Responses
/// never expose raw identifiers.
fn resolve_attachment(state: &AppState, group: &mut Group) {
    group.attachment = public_reference(state.attachments.as_ref(), group.attachment.as_deref());
}

/// GET /grupos - paginated listing, always with nested investigators. Any
/// non-empty search parameter switches to filtered search; the total then
/// counts distinct matching groups.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<GroupSearchQuery>,
) -> Result<Json<Paginated<GroupWithInvestigators>>, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let filters = query.filters()?;
    let repo = GroupRepository::new(state.pool.clone());

    let (mut groups, total) = if filters.is_empty() {
        repo.list_with_members(params.limit, params.offset()).await?
    } else {
        repo.search(&filters, params.limit, params.offset()).await?
    };

    for entry in &mut groups {
        resolve_attachment(&state, &mut entry.group);
    }
    Ok(Json(Paginated::new(groups, total, params)))
}

/// GET /grupos/with-details - the unfiltered listing under its legacy path.
pub async fn list_with_details(
    State(state): State<AppState>,
    Query(query): Query<GroupSearchQuery>,
) -> Result<Json<Paginated<GroupWithInvestigators>>, ApiError> {
    let params = PageParams::resolve(query.page.as_deref(), query.limit.as_deref());
    let repo = GroupRepository::new(state.pool.clone());

    let (mut groups, total) = repo.list_with_members(params.limit, params.offset()).await?;
    for entry in &mut groups {
        resolve_attachment(&state, &mut entry.group);
    }
    Ok(Json(Paginated::new(groups, total, params)))
}

/// GET /grupos/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Group>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let mut group = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grupo not found"))?;
    resolve_attachment(&state, &mut group);
    Ok(Json(group))
}

/// GET /grupos/:id/details - one group with its member list.
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GroupWithInvestigators>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let mut entry = repo
        .details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grupo not found"))?;
    resolve_attachment(&state, &mut entry.group);
    Ok(Json(entry))
}

/// GET /investigadores/:id/grupos - every group the investigator belongs to,
/// each with its whole roster.
pub async fn by_investigator(
    State(state): State<AppState>,
    Path(investigator_id): Path<i32>,
) -> Result<Json<Vec<InvestigatorGroup>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let mut groups = repo.by_investigator(investigator_id).await?;
    for entry in &mut groups {
        resolve_attachment(&state, &mut entry.group);
    }
    Ok(Json(groups))
}

/// Fields collected from the multipart group form. The file stays in memory
/// until validation passed.
#[derive(Debug, Default)]
struct GroupForm {
    name: String,
    resolution_number: String,
    research_line: String,
    research_type: String,
    registered_on: String,
    file: Option<(String, Vec<u8>)>,
}

impl GroupForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::bad_request("Malformed multipart form"))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "archivo" => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| "archivo".to_string());
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::bad_request("Error reading uploaded file"))?;
                    if !bytes.is_empty() {
                        form.file = Some((filename, bytes.to_vec()));
                    }
                }
                other => {
                    let value = field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("Malformed multipart form"))?;
                    match other {
                        "nombre" => form.name = value,
                        "numeroResolucion" => form.resolution_number = value,
                        "lineaInvestigacion" => form.research_line = value,
                        "tipoInvestigacion" => form.research_type = value,
                        "fechaRegistro" => form.registered_on = value,
                        _ => {}
                    }
                }
            }
        }
        Ok(form)
    }

    fn parse_date(&self) -> Result<Option<NaiveDate>, ApiError> {
        if self.registered_on.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(&self.registered_on, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                ApiError::bad_request("Invalid format for fechaRegistro, expected YYYY-MM-DD")
            })
    }
}

/// POST /grupos - multipart create with an optional `archivo` file. The file
/// is stored only after the text fields validate; a failed database insert
/// removes it again.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let form = GroupForm::read(&mut multipart).await?;

    if form.name.is_empty()
        || form.resolution_number.is_empty()
        || form.research_line.is_empty()
        || form.research_type.is_empty()
    {
        return Err(ApiError::validation_error(
            "Missing required fields: nombre, numeroResolucion, lineaInvestigacion, tipoInvestigacion",
        ));
    }
    let registered_on = form.parse_date()?.ok_or_else(|| {
        ApiError::validation_error("Missing required field: fechaRegistro (YYYY-MM-DD)")
    })?;

    let attachment = match &form.file {
        Some((filename, bytes)) => Some(state.attachments.store(filename, bytes).await?),
        None => None,
    };

    let new = NewGroup {
        name: form.name,
        resolution_number: form.resolution_number,
        research_line: form.research_line,
        research_type: form.research_type,
        registered_on,
        attachment: attachment.clone(),
    };

    let repo = GroupRepository::new(state.pool.clone());
    let mut group = match repo.create(&new).await {
        Ok(group) => group,
        Err(e) => {
            // The row never landed; remove the file so it cannot orphan.
            if let Some(id) = &attachment {
                if let Err(cleanup) = state.attachments.delete(id).await {
                    tracing::warn!("Failed to remove attachment {} after insert error: {}", id, cleanup);
                }
            }
            return Err(e.into());
        }
    };

    resolve_attachment(&state, &mut group);
    Ok((StatusCode::CREATED, Json(group)))
}

/// PUT /grupos/:id - multipart update. Empty text fields keep their stored
/// values; a new `archivo` replaces the old file, which is deleted only once
/// the row update committed.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<Group>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Grupo not found"))?;

    let form = GroupForm::read(&mut multipart).await?;
    let registered_on = form.parse_date()?.unwrap_or(existing.registered_on);

    let pick = |submitted: String, current: &str| {
        if submitted.is_empty() {
            current.to_string()
        } else {
            submitted
        }
    };

    let new_attachment = match &form.file {
        Some((filename, bytes)) => Some(state.attachments.store(filename, bytes).await?),
        None => None,
    };
    let attachment = new_attachment.clone().or_else(|| existing.attachment.clone());

    let new = NewGroup {
        name: pick(form.name, &existing.name),
        resolution_number: pick(form.resolution_number, &existing.resolution_number),
        research_line: pick(form.research_line, &existing.research_line),
        research_type: pick(form.research_type, &existing.research_type),
        registered_on,
        attachment,
    };

    let updated = settle_write(
        state.attachments.as_ref(),
        new_attachment.as_deref(),
        existing.attachment.as_deref(),
        repo.update(id, &new),
    )
    .await?;
    let mut group = updated.ok_or_else(|| ApiError::not_found("Grupo not found"))?;

    resolve_attachment(&state, &mut group);
    Ok(Json(group))
}

/// Run a row write that references a freshly stored attachment and settle the
/// files afterwards. A write that errors or matches no row leaves the new
/// file unreferenced, so it is removed; a successful write removes the
/// replaced old file. File removal failures are logged, never fatal.
async fn settle_write<T>(
    store: &dyn AttachmentStore,
    new_id: Option<&str>,
    old_id: Option<&str>,
    write: impl std::future::Future<Output = Result<Option<T>, DatabaseError>>,
) -> Result<Option<T>, ApiError> {
    match write.await {
        Ok(Some(row)) => {
            // Row now points at the new file; the old one is unreferenced.
            if new_id.is_some() {
                if let Some(old) = old_id.filter(|o| !o.is_empty()) {
                    if let Err(e) = store.delete(old).await {
                        tracing::warn!("Failed to remove replaced attachment {}: {}", old, e);
                    }
                }
            }
            Ok(Some(row))
        }
        outcome => {
            // The write did not take effect; keep the old file, only the
            // never-referenced new one goes.
            if let Some(new) = new_id {
                if let Err(e) = store.delete(new).await {
                    tracing::warn!("Failed to remove attachment {} after aborted write: {}", new, e);
                }
            }
            outcome.map_err(ApiError::from)
        }
    }
}

/// DELETE /grupos/:id - the row goes first, then the file best-effort.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());
    let existing = repo.get(id).await?;

    repo.delete(id).await?;

    if let Some(attachment) = existing.and_then(|g| g.attachment) {
        if !attachment.is_empty() {
            if let Err(e) = state.attachments.delete(&attachment).await {
                tracing::warn!("Failed to remove attachment {} of deleted group {}: {}", attachment, id, e);
            }
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /grupos/with-details - create a group and its member links in one
/// transaction. JSON only; an attachment uploaded beforehand can be passed
/// as its stored identifier in `grupo.archivo`.
pub async fn create_with_details(
    State(state): State<AppState>,
    Json(payload): Json<CreateGroupWithMembers>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    if payload.group.name.is_empty() {
        return Err(ApiError::validation_error("Missing required field: nombre"));
    }

    let repo = GroupRepository::new(state.pool.clone());
    let mut group = repo
        .create_with_members(&payload.group, &payload.members)
        .await?;

    resolve_attachment(&state, &mut group);
    Ok((StatusCode::CREATED, Json(group)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;

    fn query(year: Option<&str>) -> GroupSearchQuery {
        GroupSearchQuery {
            year: year.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_query_yields_empty_filters() {
        let filters = query(None).filters().unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let q = GroupSearchQuery {
            grupo: Some(String::new()),
            investigador: Some(String::new()),
            ..query(Some(""))
        };
        assert!(q.filters().unwrap().is_empty());
    }

    #[test]
    fn year_is_parsed_to_number() {
        let filters = query(Some("2023")).filters().unwrap();
        assert_eq!(filters.year, Some(2023));
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let err = query(Some("hace poco")).filters().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn date_parsing_accepts_iso_dates_only() {
        let mut form = GroupForm::default();
        assert_eq!(form.parse_date().unwrap(), None);

        form.registered_on = "2024-01-15".to_string();
        assert_eq!(
            form.parse_date().unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );

        form.registered_on = "15/01/2024".to_string();
        assert!(form.parse_date().is_err());
    }

    async fn replacement_fixture() -> (tempfile::TempDir, LocalStore, String, String) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "http://localhost:3000");
        let old = store.store("antiguo.pdf", b"old").await.unwrap();
        let new = store.store("nuevo.pdf", b"new").await.unwrap();
        (dir, store, old, new)
    }

    #[tokio::test]
    async fn failed_update_discards_new_file_and_keeps_old() {
        let (dir, store, old, new) = replacement_fixture().await;

        let result: Result<Option<i32>, ApiError> = settle_write(
            &store,
            Some(new.as_str()),
            Some(old.as_str()),
            async { Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)) },
        )
        .await;

        assert!(result.is_err());
        assert!(dir.path().join(&old).exists());
        assert!(!dir.path().join(&new).exists());
    }

    #[tokio::test]
    async fn update_matching_no_row_discards_new_file() {
        let (dir, store, old, new) = replacement_fixture().await;

        let result = settle_write(
            &store,
            Some(new.as_str()),
            Some(old.as_str()),
            async { Ok(None::<i32>) },
        )
        .await;

        assert!(matches!(result, Ok(None)));
        assert!(dir.path().join(&old).exists());
        assert!(!dir.path().join(&new).exists());
    }

    #[tokio::test]
    async fn committed_update_removes_replaced_file() {
        let (dir, store, old, new) = replacement_fixture().await;

        let result = settle_write(
            &store,
            Some(new.as_str()),
            Some(old.as_str()),
            async { Ok(Some(1)) },
        )
        .await;

        assert!(matches!(result, Ok(Some(1))));
        assert!(!dir.path().join(&old).exists());
        assert!(dir.path().join(&new).exists());
    }

    #[tokio::test]
    async fn update_without_new_file_keeps_old() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "http://localhost:3000");
        let old = store.store("antiguo.pdf", b"old").await.unwrap();

        let result = settle_write(&store, None, Some(old.as_str()), async { Ok(Some(1)) }).await;

        assert!(matches!(result, Ok(Some(1))));
        assert!(dir.path().join(&old).exists());
    }
}
