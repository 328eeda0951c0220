use std::sync::Arc;

use axum::Router;

use v4vision_core::{TenantRecord, TenantScope};
use v4vision_dashboard::{Salesperson, salesperson_total};
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{SalespersonFilter, SalespersonView};
use crate::app::errors::ApiResult;
use crate::app::routes::common::{self, DashboardResource, covering_scope, filter_eq};
use crate::app::services::AppServices;

pub fn router() -> Router {
    common::resource_router::<Salesperson>()
}

#[axum::async_trait]
impl DashboardResource for Salesperson {
    type Filter = SalespersonFilter;
    type View = SalespersonView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.salespeople
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.is_active, self.is_active)
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.created_at.cmp(&b.created_at)));
    }

    async fn views(services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        let scope = covering_scope(rows.iter().map(|r| r.company_id));
        let sales = match scope {
            TenantScope::Nothing => Vec::new(),
            scope => services.stores.sales.list(scope).await?,
        };
        Ok(rows
            .into_iter()
            .map(|row| {
                let total = salesperson_total(row.id, &sales);
                SalespersonView::new(row, total)
            })
            .collect())
    }

    /// A salesperson's sales go with them.
    async fn before_delete(&self, services: &AppServices) -> ApiResult<()> {
        let sales = services
            .stores
            .sales
            .list(TenantScope::Company(self.company_id()))
            .await?;
        let mut removed = 0_u32;
        for sale in sales.iter().filter(|s| s.salesperson_id == self.id) {
            if services.stores.sales.delete(sale.id).await? {
                removed += 1;
            }
        }
        tracing::debug!(salesperson = %self.id, removed, "salesperson sales removed");
        Ok(())
    }
}
