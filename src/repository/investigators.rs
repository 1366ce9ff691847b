use sqlx::PgPool;

use crate::database::DatabaseError;
use crate::models::Investigator;

const COLUMNS: &str = "id, first_name, last_name, created_at, updated_at";

pub struct InvestigatorRepository {
    pool: PgPool,
}

impl InvestigatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paginated listing ordered by name, plus the total count.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Investigator>, i64), DatabaseError> {
        let investigators = sqlx::query_as::<_, Investigator>(&format!(
            "SELECT {COLUMNS} FROM investigators \
             ORDER BY first_name, last_name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investigators")
            .fetch_one(&self.pool)
            .await?;

        Ok((investigators, total))
    }

    /// Full unpaginated listing, used by selection dropdowns.
    pub async fn list_all(&self) -> Result<Vec<Investigator>, DatabaseError> {
        let investigators = sqlx::query_as::<_, Investigator>(&format!(
            "SELECT {COLUMNS} FROM investigators ORDER BY first_name, last_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(investigators)
    }

    /// Case- and accent-insensitive substring search on first OR last name.
    pub async fn search(
        &self,
        name: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Investigator>, i64), DatabaseError> {
        let pattern = format!("%{name}%");

        let investigators = sqlx::query_as::<_, Investigator>(&format!(
            "SELECT {COLUMNS} FROM investigators \
             WHERE unaccent(first_name) ILIKE unaccent($1) \
                OR unaccent(last_name) ILIKE unaccent($1) \
             ORDER BY first_name, last_name LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM investigators \
             WHERE unaccent(first_name) ILIKE unaccent($1) \
                OR unaccent(last_name) ILIKE unaccent($1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((investigators, total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<Investigator>, DatabaseError> {
        let investigator = sqlx::query_as::<_, Investigator>(&format!(
            "SELECT {COLUMNS} FROM investigators WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(investigator)
    }

    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Investigator, DatabaseError> {
        let investigator = sqlx::query_as::<_, Investigator>(&format!(
            "INSERT INTO investigators (first_name, last_name) VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(investigator)
    }

    pub async fn update(
        &self,
        id: i32,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Investigator>, DatabaseError> {
        let investigator = sqlx::query_as::<_, Investigator>(&format!(
            "UPDATE investigators SET first_name = $1, last_name = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {COLUMNS}"
        ))
        .bind(first_name)
        .bind(last_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(investigator)
    }

    /// Deleting a missing id is a silent no-op.
    pub async fn delete(&self, id: i32) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM investigators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
