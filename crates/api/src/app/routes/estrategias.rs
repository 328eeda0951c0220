use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::post,
    Json, Router,
};
use chrono::Utc;

use v4vision_auth::{Access, AccessPolicy};
use v4vision_dashboard::Strategy;
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{SetInvestmentsRequest, StrategyFilter, StrategyView};
use crate::app::errors::ApiResult;
use crate::app::extract::ApiJson;
use crate::app::routes::common::{self, DashboardResource, POLICY, filter_eq, load, parse_body, view_one};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id/set_investimentos", post(set_investments))
        .merge(common::resource_router::<Strategy>())
}

#[axum::async_trait]
impl DashboardResource for Strategy {
    type Filter = StrategyFilter;
    type View = StrategyView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.strategies
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.ano, self.year) && filter_eq(filter.cenario, self.scenario)
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then_with(|| a.scenario.as_str().cmp(b.scenario.as_str()))
        });
    }

    async fn views(_services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        Ok(rows.into_iter().map(StrategyView::from).collect())
    }
}

/// Replace the whole monthly plan of a strategy.
///
/// The new list is validated in full before the stored plan changes, and the
/// plan is written together with its strategy, so no partial plan is visible.
pub async fn set_investments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<StrategyView>> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Write)?;

    let request: SetInvestmentsRequest = parse_body(body)?;
    let mut strategy = load::<Strategy>(&services, identity, &id, Access::Write).await?;
    strategy.replace_investments(request.investimentos, Utc::now())?;
    services.stores.strategies.update(&strategy).await?;
    tracing::info!(
        strategy = %strategy.id,
        months = strategy.investments.len(),
        "planned investments replaced"
    );
    Ok(Json(view_one::<Strategy>(&services, strategy).await?))
}
