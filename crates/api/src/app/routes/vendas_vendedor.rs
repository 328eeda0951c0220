use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;

use v4vision_core::{RecordId, TenantScope};
use v4vision_dashboard::SalespersonSale;
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{SaleFilter, SaleView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::{self, DashboardResource, covering_scope, filter_eq};
use crate::app::services::AppServices;

pub fn router() -> Router {
    common::resource_router::<SalespersonSale>()
}

#[axum::async_trait]
impl DashboardResource for SalespersonSale {
    type Filter = SaleFilter;
    type View = SaleView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.sales
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.vendedor, self.salesperson_id)
            && filter_eq(filter.ano, self.year)
            && filter_eq(filter.mes, self.month.number())
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| b.month.cmp(&a.month)));
    }

    /// Views are ordered by year and month (newest first), then salesperson name.
    async fn views(services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        let scope = covering_scope(rows.iter().map(|r| r.company_id));
        let names: HashMap<RecordId, String> = match scope {
            TenantScope::Nothing => HashMap::new(),
            scope => services
                .stores
                .salespeople
                .list(scope)
                .await?
                .into_iter()
                .map(|s| (s.id, s.name))
                .collect(),
        };
        let mut views: Vec<SaleView> = rows
            .into_iter()
            .map(|row| {
                let name = names.get(&row.salesperson_id).cloned().unwrap_or_default();
                SaleView::new(row, name)
            })
            .collect();
        views.sort_by(|a, b| {
            b.ano
                .cmp(&a.ano)
                .then_with(|| b.mes.cmp(&a.mes))
                .then_with(|| a.vendedor_nome.cmp(&b.vendedor_nome))
        });
        Ok(views)
    }

    async fn check(&self, services: &AppServices) -> ApiResult<()> {
        let found = services
            .stores
            .salespeople
            .get(TenantScope::Company(self.company_id), self.salesperson_id)
            .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(ApiError::field("vendedor", "salesperson does not belong to this company")),
        }
    }
}
