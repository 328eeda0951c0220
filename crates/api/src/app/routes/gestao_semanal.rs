use std::sync::Arc;

use axum::Router;

use v4vision_dashboard::WeeklyMetrics;
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{WeeklyFilter, WeeklyView};
use crate::app::errors::ApiResult;
use crate::app::routes::common::{self, DashboardResource, filter_eq};
use crate::app::services::AppServices;

pub fn router() -> Router {
    common::resource_router::<WeeklyMetrics>()
}

#[axum::async_trait]
impl DashboardResource for WeeklyMetrics {
    type Filter = WeeklyFilter;
    type View = WeeklyView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.weekly
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.ano, self.year)
            && filter_eq(filter.mes, self.month.number())
            && filter_eq(filter.semana, self.week.number())
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| (b.year, b.month, b.week).cmp(&(a.year, a.month, a.week)));
    }

    async fn views(_services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        Ok(rows.into_iter().map(WeeklyView::from).collect())
    }
}
