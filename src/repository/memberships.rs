use sqlx::PgPool;

use crate::database::DatabaseError;
use crate::models::{Membership, NewMembership};

const COLUMNS: &str = "id, group_id, investigator_id, role, created_at, updated_at";

/// CRUD for the group ⟷ investigator link rows. The schema deliberately does
/// not enforce uniqueness on (group_id, investigator_id); a person may hold
/// more than one role in a group.
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: &NewMembership) -> Result<Membership, DatabaseError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "INSERT INTO group_investigators (group_id, investigator_id, role) \
             VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(new.group_id)
        .bind(new.investigator_id)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(membership)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Membership>, DatabaseError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM group_investigators WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    pub async fn update(
        &self,
        id: i32,
        new: &NewMembership,
    ) -> Result<Option<Membership>, DatabaseError> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            "UPDATE group_investigators SET \
                 group_id = $1, investigator_id = $2, role = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {COLUMNS}"
        ))
        .bind(new.group_id)
        .bind(new.investigator_id)
        .bind(&new.role)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    /// Deleting a missing id is a silent no-op.
    pub async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM group_investigators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_by_group(&self, group_id: i32) -> Result<Vec<Membership>, DatabaseError> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM group_investigators WHERE group_id = $1 ORDER BY id"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Membership>, i64), DatabaseError> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            "SELECT {COLUMNS} FROM group_investigators ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_investigators")
            .fetch_one(&self.pool)
            .await?;

        Ok((memberships, total))
    }
}
