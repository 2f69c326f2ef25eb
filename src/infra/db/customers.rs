use async_trait::async_trait;

use crate::{
    application::pagination::PageWindow,
    application::repos::{CustomersRepo, CustomersWriteRepo, RepoError},
    domain::entities::{CustomerDraft, CustomerRecord},
};

use super::PostgresRepositories;
use super::util::{limit_offset, map_sqlx_error, row_count};

const CUSTOMER_COLUMNS: &str = "id, client_id, email, first_name, last_name, roles";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    client_id: i64,
    email: String,
    first_name: String,
    last_name: String,
    roles: Vec<String>,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            client_id: row.client_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            roles: row.roles,
        }
    }
}

#[async_trait]
impl CustomersRepo for PostgresRepositories {
    async fn count_customers(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row_count(count)
    }

    async fn list_customers(&self, window: PageWindow) -> Result<Vec<CustomerRecord>, RepoError> {
        let (limit, offset) = limit_offset(window)?;
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id LIMIT $1 OFFSET $2");
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    async fn count_client_customers(&self, client_id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row_count(count)
    }

    async fn list_client_customers(
        &self,
        client_id: i64,
        window: PageWindow,
    ) -> Result<Vec<CustomerRecord>, RepoError> {
        let (limit, offset) = limit_offset(window)?;
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE client_id = $1 \
             ORDER BY id LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(CustomerRecord::from))
    }
}

#[async_trait]
impl CustomersWriteRepo for PostgresRepositories {
    async fn create_customer(
        &self,
        client_id: i64,
        draft: CustomerDraft,
        roles: Vec<String>,
    ) -> Result<CustomerRecord, RepoError> {
        let sql = format!(
            "INSERT INTO customers (client_id, email, first_name, last_name, roles) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(client_id)
            .bind(draft.email)
            .bind(draft.first_name)
            .bind(draft.last_name)
            .bind(roles)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_customer(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
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
