use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{ClientsRepo, ClientsWriteRepo, RepoError},
    domain::entities::{ClientDraft, ClientRecord},
};

use super::PostgresRepositories;
use super::util::{limit_offset, map_sqlx_error, row_count};

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: i64,
    name: String,
}

impl From<ClientRow> for ClientRecord {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[async_trait]
impl ClientsRepo for PostgresRepositories {
    async fn count_clients(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row_count(count)
    }

    async fn list_clients(&self, window: PageWindow) -> Result<Vec<ClientRecord>, RepoError> {
        let (limit, offset) = limit_offset(window)?;
        let rows = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, name
            FROM clients
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ClientRecord::from).collect())
    }

    async fn find_client(&self, id: i64) -> Result<Option<ClientRecord>, RepoError> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT id, name FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ClientRecord::from))
    }
}

#[async_trait]
impl ClientsWriteRepo for PostgresRepositories {
    async fn create_client(&self, draft: ClientDraft) -> Result<ClientRecord, RepoError> {
        let row = sqlx::query_as::<_, ClientRow>(
            "INSERT INTO clients (name) VALUES ($1) RETURNING id, name",
        )
        .bind(draft.name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_client(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
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
