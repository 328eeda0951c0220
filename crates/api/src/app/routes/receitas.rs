use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::get,
    Json, Router,
};

use v4vision_auth::{Access, AccessPolicy, visible_scope};
use v4vision_core::TenantScope;
use v4vision_dashboard::{MonthlyRevenue, SalespersonSale, annual_summary, salesperson_comparison};
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{self, ComparisonRow, PeriodFilter, RevenueView, ScopeQuery, SummaryView, YearQuery};
use crate::app::errors::ApiResult;
use crate::app::extract::ApiQuery;
use crate::app::routes::common::{self, DashboardResource, POLICY, filter_eq, scoped_rows};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/retrospectiva", get(retrospective))
        .route("/comparativo_vendedores", get(salesperson_comparison_report))
        .merge(common::resource_router::<MonthlyRevenue>())
}

#[axum::async_trait]
impl DashboardResource for MonthlyRevenue {
    type Filter = PeriodFilter;
    type View = RevenueView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.revenue
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.ano, self.year) && filter_eq(filter.mes, self.month.number())
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| b.month.cmp(&a.month)));
    }

    async fn views(_services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        Ok(rows.into_iter().map(RevenueView::from).collect())
    }
}

/// Annual summary of the caller's revenue for `?ano=` (default: this year).
pub async fn retrospective(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiQuery(query): ApiQuery<YearQuery>,
) -> ApiResult<Json<SummaryView>> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Read)?;

    let year = dto::year_or_current(query.ano);
    let rows = scoped_rows::<MonthlyRevenue>(&services, identity, scope.requested(identity)?).await?;
    let summary = annual_summary(year, rows.into_iter().filter(|r| r.year == year));
    Ok(Json(SummaryView::from(summary)))
}

/// Sales totals per salesperson for `?ano=`, highest first.
pub async fn salesperson_comparison_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiQuery(query): ApiQuery<YearQuery>,
) -> ApiResult<Json<Vec<ComparisonRow>>> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Read)?;

    let year = dto::year_or_current(query.ano);
    let requested = scope.requested(identity)?;
    let tenant = visible_scope(identity, requested);
    if tenant == TenantScope::Nothing {
        return Ok(Json(Vec::new()));
    }
    let sales = scoped_rows::<SalespersonSale>(&services, identity, requested).await?;
    let salespeople = services.stores.salespeople.list(tenant).await?;
    let rows = salesperson_comparison(year, &sales, &salespeople)
        .into_iter()
        .map(ComparisonRow::from)
        .collect();
    Ok(Json(rows))
}
