//! Group persistence plus the join/collapse aggregation over the
//! group ⟷ investigator link table.
//!
//! All multi-group reads follow the same two-phase shape: first resolve the
//! distinct set of matching group ids (count + page of ids), then fetch the
//! flat join rows for exactly those ids and collapse them into nested
//! structures. Paginating the id set rather than the join rows keeps page
//! sizes in groups, not rows.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::DatabaseError;
use crate::models::{
    Group, GroupMemberRow, GroupWithInvestigators, InvestigatorGroup, InvestigatorWithRole,
    NewGroup,
};

const GROUP_COLUMNS: &str = "id, name, resolution_number, research_line, research_type, \
     registered_on, attachment, created_at, updated_at";

const JOIN_ROW_COLUMNS: &str = "g.id, g.name, g.resolution_number, g.research_line, \
     g.research_type, g.registered_on, g.attachment, g.created_at, g.updated_at, \
     i.id AS investigator_id, i.first_name AS investigator_first_name, \
     i.last_name AS investigator_last_name, i.created_at AS investigator_created_at, \
     i.updated_at AS investigator_updated_at, gi.role";

/// Optional search filters for the aggregation endpoint. All active filters
/// combine with AND; absent ones are skipped entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupFilters {
    /// Substring on the group name.
    pub name: Option<String>,
    /// Substring on the investigator full name ("first last").
    pub investigator: Option<String>,
    /// Exact registration year.
    pub year: Option<i32>,
    /// Substring on the research line.
    pub research_line: Option<String>,
    /// Substring on the research type.
    pub research_type: Option<String>,
}

impl GroupFilters {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.investigator.is_none()
            && self.year.is_none()
            && self.research_line.is_none()
            && self.research_type.is_none()
    }
}

/// One (investigator id, role) pair for the composite creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberSpec {
    #[serde(rename = "idInvestigador")]
    pub investigator_id: i32,
    #[serde(rename = "tipoRelacion")]
    pub role: String,
}

pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Group>, DatabaseError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM research_groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn create(&self, new: &NewGroup) -> Result<Group, DatabaseError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "INSERT INTO research_groups \
                 (name, resolution_number, research_line, research_type, registered_on, attachment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.resolution_number)
        .bind(&new.research_line)
        .bind(&new.research_type)
        .bind(new.registered_on)
        .bind(&new.attachment)
        .fetch_one(&self.pool)
        .await?;
        Ok(group)
    }

    /// Full overwrite of the mutable fields. Returns the stored row, or None
    /// when the id does not exist.
    pub async fn update(&self, id: i32, new: &NewGroup) -> Result<Option<Group>, DatabaseError> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "UPDATE research_groups SET \
                 name = $1, resolution_number = $2, research_line = $3, research_type = $4, \
                 registered_on = $5, attachment = $6, updated_at = NOW() \
             WHERE id = $7 \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.resolution_number)
        .bind(&new.research_line)
        .bind(&new.research_type)
        .bind(new.registered_on)
        .bind(&new.attachment)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    /// Deleting a missing id is a silent no-op. Link rows go with the group
    /// via ON DELETE CASCADE.
    pub async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM research_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A single group with its full member list.
    pub async fn details(&self, id: i32) -> Result<Option<GroupWithInvestigators>, DatabaseError> {
        let Some(group) = self.get(id).await? else {
            return Ok(None);
        };
        let investigators = self.members_of(id).await?;
        Ok(Some(GroupWithInvestigators {
            group,
            investigators,
        }))
    }

    async fn members_of(&self, group_id: i32) -> Result<Vec<InvestigatorWithRole>, DatabaseError> {
        let rows = sqlx::query_as::<_, GroupMemberRow>(&format!(
            "SELECT {JOIN_ROW_COLUMNS} \
             FROM research_groups g \
             JOIN group_investigators gi ON gi.group_id = g.id \
             JOIN investigators i ON i.id = gi.investigator_id \
             WHERE g.id = $1 \
             ORDER BY i.id"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().filter_map(GroupMemberRow::member).collect())
    }

    /// Unfiltered paginated listing with nested members, ordered by group
    /// name. Returns the page plus the total number of groups.
    pub async fn list_with_members(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<GroupWithInvestigators>, i64), DatabaseError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM research_groups")
            .fetch_one(&self.pool)
            .await?;
        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let page_ids: Vec<i32> = sqlx::query_scalar(
            "SELECT id FROM research_groups ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        if page_ids.is_empty() {
            return Ok((Vec::new(), total));
        }

        let rows = self.join_rows_for_ids(&page_ids, "g.name, g.id, i.id").await?;
        Ok((collapse_rows(rows), total))
    }

    /// Filtered search over groups, same nested shape. `total` counts
    /// distinct matching groups, never join rows; a qualifying group carries
    /// ALL of its members regardless of which one matched the filter.
    pub async fn search(
        &self,
        filters: &GroupFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<GroupWithInvestigators>, i64), DatabaseError> {
        let mut count_query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(DISTINCT g.id) \
             FROM research_groups g \
             LEFT JOIN group_investigators gi ON gi.group_id = g.id \
             LEFT JOIN investigators i ON i.id = gi.investigator_id \
             WHERE 1=1",
        );
        push_filter_clauses(&mut count_query, filters);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut ids_query = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT g.id \
             FROM research_groups g \
             LEFT JOIN group_investigators gi ON gi.group_id = g.id \
             LEFT JOIN investigators i ON i.id = gi.investigator_id \
             WHERE 1=1",
        );
        push_filter_clauses(&mut ids_query, filters);
        ids_query.push(" ORDER BY g.id LIMIT ");
        ids_query.push_bind(limit);
        ids_query.push(" OFFSET ");
        ids_query.push_bind(offset);
        let page_ids: Vec<i32> = ids_query
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;
        if page_ids.is_empty() {
            return Ok((Vec::new(), total));
        }

        let rows = self.join_rows_for_ids(&page_ids, "g.id, i.id").await?;
        Ok((collapse_rows(rows), total))
    }

    /// Every group the investigator belongs to, each with its whole roster.
    pub async fn by_investigator(
        &self,
        investigator_id: i32,
    ) -> Result<Vec<InvestigatorGroup>, DatabaseError> {
        let group_ids: Vec<i32> = sqlx::query_scalar(
            "SELECT DISTINCT g.id \
             FROM research_groups g \
             JOIN group_investigators gi ON gi.group_id = g.id \
             WHERE gi.investigator_id = $1",
        )
        .bind(investigator_id)
        .fetch_all(&self.pool)
        .await?;
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.join_rows_for_ids(&group_ids, "g.name, g.id, i.id").await?;
        Ok(collapse_rows(rows)
            .into_iter()
            .map(|g| InvestigatorGroup {
                group: g.group,
                members: g.investigators,
            })
            .collect())
    }

    /// Create a group and its member links as one atomic unit. Any failure
    /// rolls everything back (the transaction also rolls back on unwind when
    /// dropped uncommitted). Echoes only the created group.
    pub async fn create_with_members(
        &self,
        new: &NewGroup,
        members: &[MemberSpec],
    ) -> Result<Group, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(&format!(
            "INSERT INTO research_groups \
                 (name, resolution_number, research_line, research_type, registered_on, attachment) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.resolution_number)
        .bind(&new.research_line)
        .bind(&new.research_type)
        .bind(new.registered_on)
        .bind(&new.attachment)
        .fetch_one(&mut *tx)
        .await?;

        for member in members {
            sqlx::query(
                "INSERT INTO group_investigators (group_id, investigator_id, role) \
                 VALUES ($1, $2, $3)",
            )
            .bind(group.id)
            .bind(member.investigator_id)
            .bind(&member.role)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(group)
    }

    /// Detail rows for an id page, ordered so rows of the same group are
    /// contiguous.
    async fn join_rows_for_ids(
        &self,
        ids: &[i32],
        order_by: &str,
    ) -> Result<Vec<GroupMemberRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, GroupMemberRow>(&format!(
            "SELECT {JOIN_ROW_COLUMNS} \
             FROM research_groups g \
             LEFT JOIN group_investigators gi ON gi.group_id = g.id \
             LEFT JOIN investigators i ON i.id = gi.investigator_id \
             WHERE g.id = ANY($1) \
             ORDER BY {order_by}"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn push_filter_clauses(query: &mut QueryBuilder<'_, Postgres>, filters: &GroupFilters) {
    if let Some(name) = &filters.name {
        query.push(" AND unaccent(g.name) ILIKE unaccent(");
        query.push_bind(format!("%{name}%"));
        query.push(")");
    }
    if let Some(investigator) = &filters.investigator {
        query.push(" AND unaccent(i.first_name || ' ' || i.last_name) ILIKE unaccent(");
        query.push_bind(format!("%{investigator}%"));
        query.push(")");
    }
    if let Some(year) = filters.year {
        query.push(" AND EXTRACT(YEAR FROM g.registered_on)::int = ");
        query.push_bind(year);
    }
    if let Some(line) = &filters.research_line {
        query.push(" AND unaccent(g.research_line) ILIKE unaccent(");
        query.push_bind(format!("%{line}%"));
        query.push(")");
    }
    if let Some(kind) = &filters.research_type {
        query.push(" AND unaccent(g.research_type) ILIKE unaccent(");
        query.push_bind(format!("%{kind}%"));
        query.push(")");
    }
}

/// Collapse ordered flat join rows into nested groups. Groups appear in
/// first-seen order; a NULL investigator column set (left join miss) yields
/// an empty member list; repeated (group, investigator) rows from join
/// fan-out are deduplicated by investigator id.
pub fn collapse_rows(rows: Vec<GroupMemberRow>) -> Vec<GroupWithInvestigators> {
    let mut out: Vec<GroupWithInvestigators> = Vec::new();

    for row in rows {
        let idx = match out.iter().position(|g| g.group.id == row.id) {
            Some(idx) => idx,
            None => {
                out.push(GroupWithInvestigators {
                    group: row.group(),
                    investigators: Vec::new(),
                });
                out.len() - 1
            }
        };
        let entry = &mut out[idx];

        if let Some(member) = row.member() {
            if !entry.investigators.iter().any(|m| m.id == member.id) {
                entry.investigators.push(member);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn row(group_id: i32, name: &str, member: Option<(i32, &str, &str, &str)>) -> GroupMemberRow {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        GroupMemberRow {
            id: group_id,
            name: name.to_string(),
            resolution_number: format!("R-{group_id}"),
            research_line: "Ingeniería de software".to_string(),
            research_type: "Aplicada".to_string(),
            registered_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            attachment: None,
            created_at: ts,
            updated_at: ts,
            investigator_id: member.map(|(id, ..)| id),
            investigator_first_name: member.map(|(_, first, ..)| first.to_string()),
            investigator_last_name: member.map(|(_, _, last, _)| last.to_string()),
            investigator_created_at: member.map(|_| ts),
            investigator_updated_at: member.map(|_| ts),
            role: member.map(|(.., role)| role.to_string()),
        }
    }

    #[test]
    fn groups_collapse_in_first_seen_order() {
        let rows = vec![
            row(2, "Beta", Some((10, "Ana", "Lopez", "Coordinador"))),
            row(2, "Beta", Some((11, "Luis", "Quispe", "Miembro"))),
            row(5, "Alfa", Some((12, "Rosa", "Huaman", "Miembro"))),
        ];
        let collapsed = collapse_rows(rows);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].group.id, 2);
        assert_eq!(collapsed[0].investigators.len(), 2);
        assert_eq!(collapsed[1].group.id, 5);
        assert_eq!(collapsed[1].investigators.len(), 1);
    }

    #[test]
    fn group_without_members_keeps_empty_list() {
        let collapsed = collapse_rows(vec![row(7, "Gamma", None)]);
        assert_eq!(collapsed.len(), 1);
        assert!(collapsed[0].investigators.is_empty());
    }

    #[test]
    fn fan_out_duplicates_are_deduplicated_per_group() {
        let rows = vec![
            row(1, "Alfa", Some((10, "Ana", "Lopez", "Coordinador"))),
            row(1, "Alfa", Some((10, "Ana", "Lopez", "Coordinador"))),
            row(1, "Alfa", Some((11, "Luis", "Quispe", "Miembro"))),
        ];
        let collapsed = collapse_rows(rows);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].investigators.len(), 2);
    }

    #[test]
    fn same_investigator_in_two_groups_is_kept_in_both() {
        let rows = vec![
            row(1, "Alfa", Some((10, "Ana", "Lopez", "Coordinador"))),
            row(2, "Beta", Some((10, "Ana", "Lopez", "Miembro"))),
        ];
        let collapsed = collapse_rows(rows);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].investigators[0].role, "Coordinador");
        assert_eq!(collapsed[1].investigators[0].role, "Miembro");
    }

    #[test]
    fn member_rows_map_joined_columns() {
        let r = row(1, "Alfa", Some((10, "Ana", "Lopez", "Coordinador")));
        let member = r.member().unwrap();
        assert_eq!(member.id, 10);
        assert_eq!(member.first_name, "Ana");
        assert_eq!(member.last_name, "Lopez");
        assert_eq!(member.role, "Coordinador");
        assert!(row(1, "Alfa", None).member().is_none());
    }

    #[test]
    fn empty_filters_report_empty() {
        assert!(GroupFilters::default().is_empty());
        let filters = GroupFilters {
            investigator: Some("Ana".to_string()),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn filter_clauses_bind_only_active_filters() {
        let filters = GroupFilters {
            name: Some("sistemas".to_string()),
            year: Some(2023),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT g.id FROM research_groups g WHERE 1=1");
        push_filter_clauses(&mut query, &filters);
        let sql = query.sql();
        assert!(sql.contains("unaccent(g.name) ILIKE"));
        assert!(sql.contains("EXTRACT(YEAR FROM g.registered_on)"));
        assert!(!sql.contains("research_line"));
        assert!(!sql.contains("first_name"));
    }
}
