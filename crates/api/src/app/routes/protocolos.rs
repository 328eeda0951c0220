use std::sync::Arc;

use axum::Router;

use v4vision_dashboard::Protocol;
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::{ProtocolFilter, ProtocolView};
use crate::app::errors::ApiResult;
use crate::app::routes::common::{self, DashboardResource, filter_eq};
use crate::app::services::AppServices;

pub fn router() -> Router {
    common::resource_router::<Protocol>()
}

#[axum::async_trait]
impl DashboardResource for Protocol {
    type Filter = ProtocolFilter;
    type View = ProtocolView;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>> {
        &stores.protocols
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter_eq(filter.tipo, self.kind)
    }

    fn sort(rows: &mut [Self]) {
        rows.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
        });
    }

    async fn views(_services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>> {
        Ok(rows.into_iter().map(ProtocolView::from).collect())
    }
}
