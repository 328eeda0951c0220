//! Generic CRUD over tenant-owned dashboard records.
//!
//! Every dashboard resource goes through the same sequence: collection-level
//! authorization, tenant scoping, storage, object-level authorization, then
//! mapping to its view. Resources plug in filtering, ordering, views and any
//! cross-record checks through [`DashboardResource`].

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use v4vision_auth::{Access, AccessPolicy, CreationTarget, Identity, MutateWithTenant, creation_target, visible_scope};
use v4vision_core::{CompanyId, RecordId, TenantScope};
use v4vision_dashboard::DashboardRecord;
use v4vision_infra::{RecordStore, Stores};

use crate::app::dto::ScopeQuery;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::AppServices;
use crate::context::CallerContext;

/// Authorization applied to every dashboard resource.
pub const POLICY: MutateWithTenant = MutateWithTenant;

#[axum::async_trait]
pub trait DashboardResource: DashboardRecord {
    /// Query-string filters accepted by the list endpoint.
    type Filter: DeserializeOwned + Send + Sync + 'static;
    type View: Serialize + Send + 'static;

    fn store(stores: &Stores) -> &Arc<dyn RecordStore<Self>>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn sort(rows: &mut [Self]);

    async fn views(services: &AppServices, rows: Vec<Self>) -> ApiResult<Vec<Self::View>>;

    /// Rules that need other records, run before every insert and update.
    async fn check(&self, _services: &AppServices) -> ApiResult<()> {
        Ok(())
    }

    async fn before_delete(&self, _services: &AppServices) -> ApiResult<()> {
        Ok(())
    }
}

/// `GET|POST /` and `GET|PUT|PATCH|DELETE /:id` for `R`.
pub fn resource_router<R: DashboardResource>() -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/:id",
            get(retrieve::<R>)
                .put(replace::<R>)
                .patch(patch::<R>)
                .delete(destroy::<R>),
        )
}

pub async fn list<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiQuery(scope): ApiQuery<ScopeQuery>,
    ApiQuery(filter): ApiQuery<R::Filter>,
) -> ApiResult<Json<Vec<R::View>>> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Read)?;

    let mut rows: Vec<R> = scoped_rows::<R>(&services, identity, scope.requested(identity)?)
        .await?
        .into_iter()
        .filter(|row| row.matches(&filter))
        .collect();
    R::sort(&mut rows);
    Ok(Json(R::views(&services, rows).await?))
}

pub async fn retrieve<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<R::View>> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Read)?;

    let row = load::<R>(&services, identity, &id, Access::Read).await?;
    Ok(Json(view_one::<R>(&services, row).await?))
}

pub async fn create<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<R::View>)> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Write)?;

    let (requested, body) = split_company(body)?;
    let company = resolve_company(&services, identity, requested).await?;
    let input: R::Input = parse_body(body)?;

    let row = R::create(company, input, Utc::now())?;
    row.check(&services).await?;
    R::store(&services.stores).insert(&row).await?;
    tracing::info!(kind = R::KIND, id = %row.id(), %company, "record created");

    Ok((StatusCode::CREATED, Json(view_one::<R>(&services, row).await?)))
}

/// Full replace: the body must be a complete input.
pub async fn replace<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<R::View>> {
    POLICY.has_permission(Some(caller.identity()), Access::Write)?;
    let input: R::Input = parse_body(body)?;
    update_with::<R>(&services, caller.identity(), &id, R::Patch::from(input)).await
}

pub async fn patch<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<R::View>> {
    POLICY.has_permission(Some(caller.identity()), Access::Write)?;
    let patch: R::Patch = parse_body(body)?;
    update_with::<R>(&services, caller.identity(), &id, patch).await
}

pub async fn destroy<R: DashboardResource>(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let identity = caller.identity();
    POLICY.has_permission(Some(identity), Access::Write)?;

    let row = load::<R>(&services, identity, &id, Access::Write).await?;
    row.before_delete(&services).await?;
    R::store(&services.stores).delete(*row.id()).await?;
    tracing::info!(kind = R::KIND, id = %row.id(), "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_with<R: DashboardResource>(
    services: &AppServices,
    identity: &Identity,
    id: &str,
    patch: R::Patch,
) -> ApiResult<Json<R::View>> {
    let mut row = load::<R>(services, identity, id, Access::Write).await?;
    row.apply(patch, Utc::now())?;
    row.check(services).await?;
    R::store(&services.stores).update(&row).await?;
    tracing::info!(kind = R::KIND, id = %row.id(), "record updated");
    Ok(Json(view_one::<R>(services, row).await?))
}

/// Rows of `R` visible to `identity`.
pub async fn scoped_rows<R: DashboardResource>(
    services: &AppServices,
    identity: &Identity,
    requested: Option<CompanyId>,
) -> ApiResult<Vec<R>> {
    let scope = visible_scope(identity, requested);
    if scope == TenantScope::Nothing {
        return Ok(Vec::new());
    }
    Ok(R::store(&services.stores).list(scope).await?)
}

/// Load one record the caller may see, then run the object-level check.
///
/// Malformed ids and records outside the caller's scope are reported as not
/// found.
pub async fn load<R: DashboardResource>(
    services: &AppServices,
    identity: &Identity,
    id: &str,
    access: Access,
) -> ApiResult<R> {
    let id: RecordId = id.parse().map_err(|_| ApiError::not_found())?;
    let row = R::store(&services.stores)
        .get(visible_scope(identity, None), id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    POLICY.has_object_permission(Some(identity), access, &row)?;
    Ok(row)
}

pub async fn view_one<R: DashboardResource>(services: &AppServices, row: R) -> ApiResult<R::View> {
    R::views(services, vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal("record view missing"))
}

/// The narrowest scope covering every row's company.
pub fn covering_scope(companies: impl IntoIterator<Item = CompanyId>) -> TenantScope {
    let companies: BTreeSet<CompanyId> = companies.into_iter().collect();
    match companies.len() {
        0 => TenantScope::Nothing,
        1 => companies
            .into_iter()
            .next()
            .map_or(TenantScope::Nothing, TenantScope::Company),
        _ => TenantScope::All,
    }
}

/// Company stamped on a new record.
pub async fn resolve_company(
    services: &AppServices,
    identity: &Identity,
    requested: Option<CompanyId>,
) -> ApiResult<CompanyId> {
    match creation_target(identity, requested)? {
        CreationTarget::Own(company) => Ok(company),
        CreationTarget::Requested(company) => {
            if services.stores.companies.get(company).await?.is_none() {
                return Err(ApiError::field("company", "company does not exist"));
            }
            Ok(company)
        }
    }
}

/// Take the optional `company` key out of a JSON object body.
pub fn split_company(mut body: serde_json::Value) -> ApiResult<(Option<CompanyId>, serde_json::Value)> {
    let raw = body.as_object_mut().and_then(|map| map.remove("company"));
    let company = match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(
            s.parse::<CompanyId>()
                .map_err(|e| ApiError::field("company", e.to_string()))?,
        ),
        Some(_) => return Err(ApiError::field("company", "expected a company id")),
    };
    Ok((company, body))
}

pub fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|e| ApiError::validation(e.to_string()))
}

/// Keep rows whose value equals the filter, or all rows without a filter.
pub fn filter_eq<T: PartialEq>(filter: Option<T>, value: T) -> bool {
    filter.is_none_or(|f| f == value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn company_is_split_from_the_body() {
        let company = CompanyId::new();
        let (found, rest) = split_company(json!({"company": company.to_string(), "nome": "Ana"})).unwrap();
        assert_eq!(found, Some(company));
        assert_eq!(rest, json!({"nome": "Ana"}));

        let (found, _) = split_company(json!({"nome": "Ana", "company": null})).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn malformed_company_is_a_field_error() {
        let err = split_company(json!({"company": "acme"})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("company"));
        assert!(split_company(json!({"company": 7})).is_err());
    }

    #[test]
    fn covering_scope_narrows_to_a_single_company() {
        let a = CompanyId::new();
        let b = CompanyId::new();
        assert_eq!(covering_scope([]), TenantScope::Nothing);
        assert_eq!(covering_scope([a, a]), TenantScope::Company(a));
        assert_eq!(covering_scope([a, b]), TenantScope::All);
    }

    #[test]
    fn missing_filter_matches_everything() {
        assert!(filter_eq(None, 3));
        assert!(filter_eq(Some(3), 3));
        assert!(!filter_eq(Some(4), 3));
    }
}
