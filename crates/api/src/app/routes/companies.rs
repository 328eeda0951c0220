//! Companies (tenants), addressed by slug.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use v4vision_auth::{Access, AccessPolicy, Identity, PlatformAdminOnly, SameTenant, visible_scope};
use v4vision_core::{Company, CompanyPatch, NewCompany, TenantScope};

use crate::app::dto::CompanyView;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::common::parse_body;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/:slug",
            get(get_company)
                .put(replace_company)
                .patch(patch_company)
                .delete(delete_company),
        )
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> ApiResult<Json<Vec<CompanyView>>> {
    let identity = caller.identity();
    SameTenant.has_permission(Some(identity), Access::Read)?;

    let scope = visible_scope(identity, None);
    if scope == TenantScope::Nothing {
        return Ok(Json(Vec::new()));
    }
    let companies = services.stores.companies.list(scope).await?;
    let mut views = Vec::with_capacity(companies.len());
    for company in companies {
        views.push(view(&services, company).await?);
    }
    Ok(Json(views))
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CompanyView>> {
    let identity = caller.identity();
    SameTenant.has_permission(Some(identity), Access::Read)?;

    let company = load(&services, identity, &slug).await?;
    SameTenant.has_object_permission(Some(identity), Access::Read, &company)?;
    Ok(Json(view(&services, company).await?))
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<CompanyView>)> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;

    let input: NewCompany = parse_body(body)?;
    let company = Company::register(input, Utc::now())?;
    services.stores.companies.insert(&company).await?;
    tracing::info!(company = %company.id, slug = %company.slug, "company created");
    Ok((StatusCode::CREATED, Json(view(&services, company).await?)))
}

pub async fn replace_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(slug): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<CompanyView>> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let input: NewCompany = parse_body(body)?;
    save_patch(&services, caller.identity(), &slug, input.into()).await
}

pub async fn patch_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(slug): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<CompanyView>> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let patch: CompanyPatch = parse_body(body)?;
    save_patch(&services, caller.identity(), &slug, patch).await
}

/// Deletes the company with its users and dashboard records.
pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let company = load(&services, caller.identity(), &slug).await?;
    if !services.stores.delete_company(company.id).await? {
        return Err(ApiError::not_found());
    }
    tracing::info!(company = %company.id, slug = %company.slug, "company deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn save_patch(
    services: &AppServices,
    identity: &Identity,
    slug: &str,
    patch: CompanyPatch,
) -> ApiResult<Json<CompanyView>> {
    let mut company = load(services, identity, slug).await?;
    company.apply(patch, Utc::now())?;
    services.stores.companies.update(&company).await?;
    tracing::info!(company = %company.id, "company updated");
    Ok(Json(view(services, company).await?))
}

/// A company inside the caller's scope; anything else is not found.
async fn load(services: &AppServices, identity: &Identity, slug: &str) -> ApiResult<Company> {
    let scope = visible_scope(identity, None);
    services
        .stores
        .companies
        .get_by_slug(slug)
        .await?
        .filter(|c| scope.includes(c.id))
        .ok_or_else(ApiError::not_found)
}

async fn view(services: &AppServices, company: Company) -> ApiResult<CompanyView> {
    let users = services.stores.users.count_by_company(company.id).await?;
    Ok(CompanyView::new(company, users))
}
