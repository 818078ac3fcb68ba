use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::QueryBuilder;
use sqlx::Sqlite;
use sqlx::SqliteConnection;
use sqlx::SqlitePool;

use crate::error::MetadataError;
use crate::Result;

const COLUMNS: &str = "id, name, parent_id, level, created_at, updated_at, deleted_at";

fn not_found(id: i64) -> MetadataError {
    MetadataError::NotFound(format!("organization {id}"))
}

/// Access to the `organizations` table. Soft-deleted rows are invisible to
/// every read.
///
/// Methods with a trailing underscore run on a caller-provided connection, so
/// several of them can share one transaction.
pub struct Organizations {
    pool: SqlitePool,
}

impl Organizations {
    pub fn new(pool: SqlitePool) -> Self {
        Organizations { pool }
    }

    pub async fn create_(
        &self,
        conn: &mut SqliteConnection,
        req: CreateOrganizationRequest,
    ) -> Result<Organization> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO organizations (name, parent_id, level, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        );

        Ok(sqlx::query_as::<_, Organization>(&query)
            .bind(req.name)
            .bind(req.parent_id)
            .bind(req.level)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?)
    }

    pub async fn get_by_id_(&self, conn: &mut SqliteConnection, id: i64) -> Result<Organization> {
        let query =
            format!("SELECT {COLUMNS} FROM organizations WHERE id = ? AND deleted_at IS NULL");

        sqlx::query_as::<_, Organization>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Writes name and parent reference only; `level` is left untouched.
    pub async fn update_(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        req: UpdateOrganizationRequest,
    ) -> Result<Organization> {
        let query = format!(
            "UPDATE organizations SET name = ?, parent_id = ?, updated_at = ? \
             WHERE id = ? AND deleted_at IS NULL RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, Organization>(&query)
            .bind(req.name)
            .bind(req.parent_id)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn get_by_parent_ids_(
        &self,
        conn: &mut SqliteConnection,
        ids: &BTreeSet<i64>,
    ) -> Result<Vec<Organization>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM organizations WHERE deleted_at IS NULL AND parent_id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        Ok(qb
            .build_query_as::<Organization>()
            .fetch_all(&mut *conn)
            .await?)
    }

    /// Marks every live row in `ids` as deleted in one statement and returns
    /// how many rows changed. Rows that are already deleted are left alone.
    pub async fn soft_delete_(
        &self,
        conn: &mut SqliteConnection,
        ids: &BTreeSet<i64>,
    ) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE organizations SET deleted_at = ");
        qb.push_bind(now);
        qb.push(", updated_at = ");
        qb.push_bind(now);
        qb.push(" WHERE deleted_at IS NULL AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        Ok(qb.build().execute(&mut *conn).await?.rows_affected())
    }

    pub async fn list_(&self, conn: &mut SqliteConnection) -> Result<Vec<Organization>> {
        let query =
            format!("SELECT {COLUMNS} FROM organizations WHERE deleted_at IS NULL ORDER BY id");

        Ok(sqlx::query_as::<_, Organization>(&query)
            .fetch_all(&mut *conn)
            .await?)
    }

    pub async fn create(&self, req: CreateOrganizationRequest) -> Result<Organization> {
        let mut conn = self.pool.acquire().await?;

        self.create_(&mut conn, req).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Organization> {
        let mut conn = self.pool.acquire().await?;

        self.get_by_id_(&mut conn, id).await
    }

    pub async fn update(&self, id: i64, req: UpdateOrganizationRequest) -> Result<Organization> {
        let mut conn = self.pool.acquire().await?;

        self.update_(&mut conn, id, req).await
    }

    pub async fn get_by_parent_ids(&self, ids: &BTreeSet<i64>) -> Result<Vec<Organization>> {
        let mut conn = self.pool.acquire().await?;

        self.get_by_parent_ids_(&mut conn, ids).await
    }

    pub async fn soft_delete(&self, ids: &BTreeSet<i64>) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;

        self.soft_delete_(&mut conn, ids).await
    }

    pub async fn list(&self) -> Result<Vec<Organization>> {
        let mut conn = self.pool.acquire().await?;

        self.list_(&mut conn).await
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateOrganizationRequest {
    pub name: String,
    pub parent_id: Option<i64>,
}
