use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{PhonesRepo, PhonesWriteRepo, RepoError},
    domain::entities::{PhoneDraft, PhoneRecord},
};

use super::PostgresRepositories;
use super::util::{limit_offset, map_sqlx_error, row_count};

#[derive(sqlx::FromRow)]
struct PhoneRow {
    id: i64,
    name: String,
    brand: Option<String>,
    os: Option<String>,
    screen_size: Option<String>,
}

impl From<PhoneRow> for PhoneRecord {
    fn from(row: PhoneRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            os: row.os,
            screen_size: row.screen_size,
        }
    }
}

#[async_trait]
impl PhonesRepo for PostgresRepositories {
    async fn count_phones(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM phones")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row_count(count)
    }

    async fn list_phones(&self, window: PageWindow) -> Result<Vec<PhoneRecord>, RepoError> {
        let (limit, offset) = limit_offset(window)?;
        let rows = sqlx::query_as::<_, PhoneRow>(
            r#"
            SELECT id, name, brand, os, screen_size
            FROM phones
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PhoneRecord::from).collect())
    }

    async fn find_phone(&self, id: i64) -> Result<Option<PhoneRecord>, RepoError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            "SELECT id, name, brand, os, screen_size FROM phones WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PhoneRecord::from))
    }
}

#[async_trait]
impl PhonesWriteRepo for PostgresRepositories {
    async fn create_phone(&self, draft: PhoneDraft) -> Result<PhoneRecord, RepoError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            r#"
            INSERT INTO phones (name, brand, os, screen_size)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, brand, os, screen_size
            "#,
        )
        .bind(draft.name)
        .bind(draft.brand)
        .bind(draft.os)
        .bind(draft.screen_size)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_phone(&self, id: i64, draft: PhoneDraft) -> Result<PhoneRecord, RepoError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            r#"
            UPDATE phones
            SET name = $2, brand = $3, os = $4, screen_size = $5
            WHERE id = $1
            RETURNING id, name, brand, os, screen_size
            "#,
        )
        .bind(id)
        .bind(draft.name)
        .bind(draft.brand)
        .bind(draft.os)
        .bind(draft.screen_size)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PhoneRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_phone(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM phones WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
