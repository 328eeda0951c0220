//! Infrastructure layer: storage traits and their in-memory and Postgres
//! implementations.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

use std::sync::Arc;

use v4vision_dashboard::{MonthlyRevenue, Protocol, Salesperson, SalespersonSale, Strategy, WeeklyMetrics};

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryCompanyStore, InMemoryRecordStore, InMemoryRevokedTokens, InMemoryUserStore};
pub use postgres::{PostgresCompanyStore, PostgresRecordStore, PostgresRevokedTokens, PostgresUserStore};
pub use store::{CompanyStore, RecordStore, RevokedTokenStore, UserStore};

/// Every store the application needs, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub companies: Arc<dyn CompanyStore>,
    pub users: Arc<dyn UserStore>,
    pub salespeople: Arc<dyn RecordStore<Salesperson>>,
    pub revenue: Arc<dyn RecordStore<MonthlyRevenue>>,
    pub sales: Arc<dyn RecordStore<SalespersonSale>>,
    pub strategies: Arc<dyn RecordStore<Strategy>>,
    pub weekly: Arc<dyn RecordStore<WeeklyMetrics>>,
    pub protocols: Arc<dyn RecordStore<Protocol>>,
    pub revoked_tokens: Arc<dyn RevokedTokenStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            companies: Arc::new(InMemoryCompanyStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            salespeople: Arc::new(InMemoryRecordStore::new()),
            revenue: Arc::new(InMemoryRecordStore::new()),
            sales: Arc::new(InMemoryRecordStore::new()),
            strategies: Arc::new(InMemoryRecordStore::new()),
            weekly: Arc::new(InMemoryRecordStore::new()),
            protocols: Arc::new(InMemoryRecordStore::new()),
            revoked_tokens: Arc::new(InMemoryRevokedTokens::new()),
        }
    }

    /// Connect, apply the schema and build Postgres-backed stores.
    pub async fn postgres(database_url: &str) -> StoreResult<Self> {
        let pool = postgres::connect(database_url).await?;
        postgres::migrate(&pool).await?;
        tracing::info!("postgres schema ready");
        Ok(Self {
            companies: Arc::new(PostgresCompanyStore::new(pool.clone())),
            users: Arc::new(PostgresUserStore::new(pool.clone())),
            salespeople: Arc::new(PostgresRecordStore::new(pool.clone())),
            revenue: Arc::new(PostgresRecordStore::new(pool.clone())),
            sales: Arc::new(PostgresRecordStore::new(pool.clone())),
            strategies: Arc::new(PostgresRecordStore::new(pool.clone())),
            weekly: Arc::new(PostgresRecordStore::new(pool.clone())),
            protocols: Arc::new(PostgresRecordStore::new(pool.clone())),
            revoked_tokens: Arc::new(PostgresRevokedTokens::new(pool)),
        })
    }

    /// Remove a company together with its users and records.
    ///
    /// Postgres already cascades through foreign keys; the explicit sweep
    /// keeps the in-memory stores consistent.
    pub async fn delete_company(&self, id: v4vision_core::CompanyId) -> StoreResult<bool> {
        let removed = self.companies.delete(id).await?;
        if removed {
            self.users.delete_company(id).await?;
            self.salespeople.delete_company(id).await?;
            self.revenue.delete_company(id).await?;
            self.sales.delete_company(id).await?;
            self.strategies.delete_company(id).await?;
            self.weekly.delete_company(id).await?;
            self.protocols.delete_company(id).await?;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
