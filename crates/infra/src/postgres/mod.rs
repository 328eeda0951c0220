//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Backend` |
//! | PoolClosed / IO / decode | n/a | `Backend` |
//!
//! Deleting a company cascades to its users and records through foreign keys.

use std::marker::PhantomData;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use v4vision_auth::{Role, User, UserScope};
use v4vision_core::{Company, CompanyId, RecordId, TenantRecord, TenantScope, UserId};

use crate::error::{StoreError, StoreResult};
use crate::store::{CompanyStore, RecordStore, RevokedTokenStore, UserStore};

const SCHEMA: &str = include_str!("schema.sql");

/// Open a connection pool.
pub async fn connect(database_url: &str) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create any missing tables and indexes.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("migrate", e))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(
                    db_err
                        .constraint()
                        .map_or_else(|| msg.clone(), |c| format!("unique constraint {c} violated")),
                ),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(format!("connection pool closed in {operation}")),
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::backend(format!("failed to read column {name}: {e}")))
}

#[derive(Debug, Clone)]
pub struct PostgresCompanyStore {
    pool: PgPool,
}

impl PostgresCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMPANY_COLUMNS: &str = "id, name, slug, logo, primary_color, is_active, created_at, updated_at";

fn company_from_row(row: &PgRow) -> StoreResult<Company> {
    Ok(Company {
        id: CompanyId::from_uuid(column(row, "id")?),
        name: column(row, "name")?,
        slug: column(row, "slug")?,
        logo: column(row, "logo")?,
        primary_color: column(row, "primary_color")?,
        is_active: column(row, "is_active")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

#[async_trait]
impl CompanyStore for PostgresCompanyStore {
    #[instrument(skip(self), err)]
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<Company>> {
        let rows = match scope {
            TenantScope::Nothing => return Ok(Vec::new()),
            TenantScope::All => {
                sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name, slug"))
                    .fetch_all(&self.pool)
                    .await
            }
            TenantScope::Company(id) => {
                sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("list_companies", e))?;
        rows.iter().map(company_from_row).collect()
    }

    async fn get(&self, id: CompanyId) -> StoreResult<Option<Company>> {
        sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_company", e))?
            .as_ref()
            .map(company_from_row)
            .transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Company>> {
        sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_company_by_slug", e))?
            .as_ref()
            .map(company_from_row)
            .transpose()
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert(&self, company: &Company) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, slug, logo, primary_color, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.logo)
        .bind(&company.primary_color)
        .bind(company.is_active)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(())
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn update(&self, company: &Company) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, slug = $3, logo = $4, primary_color = $5, is_active = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.slug)
        .bind(&company.logo)
        .bind(&company.primary_color)
        .bind(company.is_active)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_company", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: CompanyId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_company", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, company_id, role, avatar, is_active, is_staff, \
                            date_joined, password_hash";

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = column(row, "role")?;
    let company: Option<Uuid> = column(row, "company_id")?;
    Ok(User {
        id: UserId::from_uuid(column(row, "id")?),
        email: column(row, "email")?,
        first_name: column(row, "first_name")?,
        last_name: column(row, "last_name")?,
        company_id: company.map(CompanyId::from_uuid),
        role: Role::from_str(&role).map_err(|e| StoreError::backend(e.to_string()))?,
        avatar: column(row, "avatar")?,
        is_active: column(row, "is_active")?,
        is_staff: column(row, "is_staff")?,
        date_joined: column(row, "date_joined")?,
        password_hash: column(row, "password_hash")?,
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), err)]
    async fn list(&self, scope: UserScope) -> StoreResult<Vec<User>> {
        let order = "ORDER BY first_name, last_name, email";
        let rows = match scope {
            UserScope::All => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users {order}"))
                    .fetch_all(&self.pool)
                    .await
            }
            UserScope::Company(company) => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE company_id = $1 {order}"))
                    .bind(company.as_uuid())
                    .fetch_all(&self.pool)
                    .await
            }
            UserScope::OnlySelf(id) => {
                sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_email", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, first_name, last_name, company_id, role, avatar,
                is_active, is_staff, date_joined, password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.company_id.map(Uuid::from))
        .bind(user.role.as_str())
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.date_joined)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4, company_id = $5, role = $6,
                avatar = $7, is_active = $8, is_staff = $9, password_hash = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.company_id.map(Uuid::from))
        .bind(user.role.as_str())
        .bind(&user.avatar)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE company_id = $1")
            .bind(company.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_company_users", e))?;
        Ok(result.rows_affected())
    }

    async fn count_by_company(&self, company: CompanyId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE company_id = $1")
            .bind(company.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;
        let n: i64 = column(&row, "n")?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

/// JSONB-backed store for one record kind, discriminated by `R::KIND`.
#[derive(Debug)]
pub struct PostgresRecordStore<R> {
    pool: PgPool,
    _record: PhantomData<fn() -> R>,
}

impl<R> PostgresRecordStore<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }
}

fn record_from_row<R: DeserializeOwned>(row: &PgRow) -> StoreResult<R> {
    let body: serde_json::Value = column(row, "body")?;
    serde_json::from_value(body).map_err(|e| StoreError::backend(format!("failed to decode record body: {e}")))
}

fn record_body<R: Serialize>(record: &R) -> StoreResult<serde_json::Value> {
    serde_json::to_value(record).map_err(|e| StoreError::backend(format!("failed to encode record body: {e}")))
}

#[async_trait]
impl<R> RecordStore<R> for PostgresRecordStore<R>
where
    R: TenantRecord + Serialize + DeserializeOwned,
{
    #[instrument(skip(self), fields(kind = R::KIND), err)]
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<R>> {
        let rows = match scope {
            TenantScope::Nothing => return Ok(Vec::new()),
            TenantScope::All => {
                sqlx::query("SELECT body FROM dashboard_records WHERE kind = $1 ORDER BY created_at, id")
                    .bind(R::KIND)
                    .fetch_all(&self.pool)
                    .await
            }
            TenantScope::Company(company) => {
                sqlx::query(
                    "SELECT body FROM dashboard_records WHERE kind = $1 AND company_id = $2 ORDER BY created_at, id",
                )
                .bind(R::KIND)
                .bind(company.as_uuid())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("list_records", e))?;
        rows.iter().map(record_from_row).collect()
    }

    async fn get(&self, scope: TenantScope, id: RecordId) -> StoreResult<Option<R>> {
        let row = match scope {
            TenantScope::Nothing => return Ok(None),
            TenantScope::All => {
                sqlx::query("SELECT body FROM dashboard_records WHERE kind = $1 AND id = $2")
                    .bind(R::KIND)
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
            }
            TenantScope::Company(company) => {
                sqlx::query("SELECT body FROM dashboard_records WHERE kind = $1 AND id = $2 AND company_id = $3")
                    .bind(R::KIND)
                    .bind(id.as_uuid())
                    .bind(company.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("get_record", e))?;
        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(kind = R::KIND, record_id = %record.id()), err)]
    async fn insert(&self, record: &R) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dashboard_records (id, kind, company_id, natural_key, body)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(R::KIND)
        .bind(record.company_id().as_uuid())
        .bind(record.natural_key())
        .bind(record_body(record)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_record", e))?;
        Ok(())
    }

    #[instrument(skip(self, record), fields(kind = R::KIND, record_id = %record.id()), err)]
    async fn update(&self, record: &R) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE dashboard_records
            SET company_id = $3, natural_key = $4, body = $5, updated_at = NOW()
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(R::KIND)
        .bind(record.id().as_uuid())
        .bind(record.company_id().as_uuid())
        .bind(record.natural_key())
        .bind(record_body(record)?)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_record", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM dashboard_records WHERE kind = $1 AND id = $2")
            .bind(R::KIND)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_record", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM dashboard_records WHERE kind = $1 AND company_id = $2")
            .bind(R::KIND)
            .bind(company.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_company_records", e))?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresRevokedTokens {
    pool: PgPool,
}

impl PostgresRevokedTokens {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevokedTokenStore for PostgresRevokedTokens {
    async fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("purge_revoked_tokens", e))?;
        sqlx::query("INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING")
            .bind(jti)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("revoke_token", e))?;
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 AS hit FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_revoked", e))?;
        Ok(row.is_some())
    }
}
