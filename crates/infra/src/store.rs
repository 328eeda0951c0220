//! Storage abstractions.
//!
//! Every read takes an explicit scope computed by the tenant-scoping resolver;
//! stores never decide visibility themselves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use v4vision_auth::{User, UserScope};
use v4vision_core::{Company, CompanyId, RecordId, TenantRecord, TenantScope, UserId};

use crate::error::StoreResult;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Companies in `scope`, ordered by name.
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<Company>>;
    async fn get(&self, id: CompanyId) -> StoreResult<Option<Company>>;
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Company>>;
    /// Fails with `Conflict` when the slug is taken.
    async fn insert(&self, company: &Company) -> StoreResult<()>;
    /// Fails with `Conflict` when the slug is taken, `NotFound` when absent.
    async fn update(&self, company: &Company) -> StoreResult<()>;
    async fn delete(&self, id: CompanyId) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Users in `scope`, ordered by first then last name.
    async fn list(&self, scope: UserScope) -> StoreResult<Vec<User>>;
    async fn get(&self, id: UserId) -> StoreResult<Option<User>>;
    /// `email` must already be normalised.
    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> StoreResult<()>;
    async fn update(&self, user: &User) -> StoreResult<()>;
    async fn delete(&self, id: UserId) -> StoreResult<bool>;
    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64>;
    async fn count_by_company(&self, company: CompanyId) -> StoreResult<u64>;
}

/// Storage for one kind of tenant-owned record.
#[async_trait]
pub trait RecordStore<R>: Send + Sync
where
    R: TenantRecord + Serialize + DeserializeOwned,
{
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<R>>;
    /// A record outside `scope` is reported as absent.
    async fn get(&self, scope: TenantScope, id: RecordId) -> StoreResult<Option<R>>;
    /// Fails with `Conflict` when the natural key is taken within the company.
    async fn insert(&self, record: &R) -> StoreResult<()>;
    async fn update(&self, record: &R) -> StoreResult<()>;
    async fn delete(&self, id: RecordId) -> StoreResult<bool>;
    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64>;
}

/// Refresh tokens revoked by logout, keyed by token id.
#[async_trait]
pub trait RevokedTokenStore: Send + Sync {
    /// Entries may be forgotten once `expires_at` has passed.
    async fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;
    async fn is_revoked(&self, jti: Uuid) -> StoreResult<bool>;
}
