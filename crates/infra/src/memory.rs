//! In-memory stores for tests and local development.
//!
//! Same uniqueness rules as the Postgres schema; nothing survives a restart.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use v4vision_auth::{User, UserScope};
use v4vision_core::{Company, CompanyId, RecordId, TenantRecord, TenantScope, UserId};

use crate::error::{StoreError, StoreResult};
use crate::store::{CompanyStore, RecordStore, RevokedTokenStore, UserStore};

#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    inner: RwLock<HashMap<CompanyId, Company>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slug_taken(map: &HashMap<CompanyId, Company>, company: &Company) -> bool {
    map.values().any(|c| c.id != company.id && c.slug == company.slug)
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<Company>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<Company> = map.values().filter(|c| scope.includes(c.id)).cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.slug.cmp(&b.slug)));
        Ok(out)
    }

    async fn get(&self, id: CompanyId) -> StoreResult<Option<Company>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Company>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().find(|c| c.slug == slug).cloned())
    }

    async fn insert(&self, company: &Company) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if slug_taken(&map, company) {
            return Err(StoreError::Conflict(format!("slug '{}' is already in use", company.slug)));
        }
        map.insert(company.id, company.clone());
        Ok(())
    }

    async fn update(&self, company: &Company) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if !map.contains_key(&company.id) {
            return Err(StoreError::NotFound);
        }
        if slug_taken(&map, company) {
            return Err(StoreError::Conflict(format!("slug '{}' is already in use", company.slug)));
        }
        map.insert(company.id, company.clone());
        Ok(())
    }

    async fn delete(&self, id: CompanyId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(map: &HashMap<UserId, User>, user: &User) -> bool {
    map.values().any(|u| u.id != user.id && u.email == user.email)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self, scope: UserScope) -> StoreResult<Vec<User>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<User> = map.values().filter(|u| scope.includes(u)).cloned().collect();
        out.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(out)
    }

    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if email_taken(&map, user) {
            return Err(StoreError::Conflict(format!("email '{}' is already registered", user.email)));
        }
        map.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if !map.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if email_taken(&map, user) {
            return Err(StoreError::Conflict(format!("email '{}' is already registered", user.email)));
        }
        map.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: UserId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let before = map.len();
        map.retain(|_, u| u.company_id != Some(company));
        Ok((before - map.len()) as u64)
    }

    async fn count_by_company(&self, company: CompanyId) -> StoreResult<u64> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.values().filter(|u| u.company_id == Some(company)).count() as u64)
    }
}

/// Tenant-owned records of one kind.
#[derive(Debug)]
pub struct InMemoryRecordStore<R> {
    inner: RwLock<HashMap<RecordId, R>>,
}

impl<R> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<R> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn natural_key_taken<R: TenantRecord>(map: &HashMap<RecordId, R>, record: &R) -> Option<String> {
    let key = record.natural_key()?;
    map.values()
        .any(|r| {
            r.id() != record.id()
                && r.company_id() == record.company_id()
                && r.natural_key().as_deref() == Some(key.as_str())
        })
        .then_some(key)
}

#[async_trait]
impl<R> RecordStore<R> for InMemoryRecordStore<R>
where
    R: TenantRecord + Serialize + DeserializeOwned,
{
    async fn list(&self, scope: TenantScope) -> StoreResult<Vec<R>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map
            .values()
            .filter(|r| scope.includes(r.company_id()))
            .cloned()
            .collect())
    }

    async fn get(&self, scope: TenantScope, id: RecordId) -> StoreResult<Option<R>> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&id).filter(|r| scope.includes(r.company_id())).cloned())
    }

    async fn insert(&self, record: &R) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if let Some(key) = natural_key_taken(&map, record) {
            return Err(StoreError::Conflict(format!("{} '{key}' already exists", R::KIND)));
        }
        map.insert(*record.id(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &R) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if !map.contains_key(record.id()) {
            return Err(StoreError::NotFound);
        }
        if let Some(key) = natural_key_taken(&map, record) {
            return Err(StoreError::Conflict(format!("{} '{key}' already exists", R::KIND)));
        }
        map.insert(*record.id(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn delete_company(&self, company: CompanyId) -> StoreResult<u64> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let before = map.len();
        map.retain(|_, r| r.company_id() != company);
        Ok((before - map.len()) as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRevokedTokens {
    inner: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl InMemoryRevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevokedTokenStore for InMemoryRevokedTokens {
    async fn revoke(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let now = Utc::now();
        map.retain(|_, exp| *exp > now);
        map.insert(jti, expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let map = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.contains_key(&jti))
    }
}
