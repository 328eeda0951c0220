//! User administration plus self-service profile and password endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use v4vision_auth::{
    Access, AccessPolicy, CompanyAdminOrAbove, Identity, NewUser, PlatformAdminOnly, ProfilePatch, User,
    UserPatch, user_scope, validate_new_password,
};
use v4vision_core::{Company, CompanyId, UserId};

use crate::app::dto::{ChangePasswordRequest, MessageResponse, UserReplace, UserView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::common::parse_body;
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(me).patch(update_me))
        .route("/change_password", post(change_password))
        .route(
            "/:id",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> ApiResult<Json<Vec<UserView>>> {
    let identity = caller.identity();
    CompanyAdminOrAbove.has_permission(Some(identity), Access::Read)?;

    let users = services.stores.users.list(user_scope(identity)).await?;
    let mut companies: HashMap<CompanyId, Option<Company>> = HashMap::new();
    let mut views = Vec::with_capacity(users.len());
    for user in &users {
        let company = match user.company_id {
            Some(id) => match companies.get(&id) {
                Some(cached) => cached.clone(),
                None => {
                    let found = services.stores.companies.get(id).await?;
                    companies.insert(id, found.clone());
                    found
                }
            },
            None => None,
        };
        views.push(UserView::new(user, company.as_ref()));
    }
    Ok(Json(views))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserView>> {
    let identity = caller.identity();
    CompanyAdminOrAbove.has_permission(Some(identity), Access::Read)?;

    let user = load_user(&services, identity, &id).await?;
    view(&services, &user).await.map(Json)
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;

    let input: NewUser = parse_body(body)?;
    let user = services.register_user(input).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok((StatusCode::CREATED, Json(view(&services, &user).await?)))
}

pub async fn replace_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<UserView>> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let input: UserReplace = parse_body(body)?;
    let user = load_user(&services, caller.identity(), &id).await?;
    save_patch(&services, user, input.into()).await.map(Json)
}

pub async fn patch_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<Json<UserView>> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let patch: UserPatch = parse_body(body)?;
    let user = load_user(&services, caller.identity(), &id).await?;
    save_patch(&services, user, patch).await.map(Json)
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;
    let user = load_user(&services, caller.identity(), &id).await?;
    if !services.stores.users.delete(user.id).await? {
        return Err(ApiError::not_found());
    }
    tracing::info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
) -> ApiResult<Json<UserView>> {
    view(&services, caller.user()).await.map(Json)
}

/// Profile fields only; role, company and activation stay as they are.
pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> ApiResult<Json<UserView>> {
    save_patch(&services, caller.user().clone(), patch.into()).await.map(Json)
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let mut user = caller.user().clone();
    if !services.verify_password(&body.old_password, &user.password_hash).await? {
        return Err(ApiError::field("old_password", "current password is incorrect"));
    }
    validate_new_password("new_password", &body.new_password)?;

    user.password_hash = services.hash_password(&body.new_password).await?;
    services.stores.users.update(&user).await?;
    tracing::info!(user_id = %user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Senha alterada com sucesso.",
    }))
}

/// The user's company, if any.
pub async fn company_of(services: &AppServices, user: &User) -> ApiResult<Option<Company>> {
    match user.company_id {
        Some(id) => Ok(services.stores.companies.get(id).await?),
        None => Ok(None),
    }
}

async fn view(services: &AppServices, user: &User) -> ApiResult<UserView> {
    let company = company_of(services, user).await?;
    Ok(UserView::new(user, company.as_ref()))
}

/// A user visible to `identity`; anyone else is reported as not found.
async fn load_user(services: &AppServices, identity: &Identity, id: &str) -> ApiResult<User> {
    let id: UserId = id.parse().map_err(|_| ApiError::not_found())?;
    let scope = user_scope(identity);
    services
        .stores
        .users
        .get(id)
        .await?
        .filter(|u| scope.includes(u))
        .ok_or_else(ApiError::not_found)
}

async fn save_patch(services: &AppServices, mut user: User, patch: UserPatch) -> ApiResult<UserView> {
    if let Some(Some(company)) = patch.company {
        if services.stores.companies.get(company).await?.is_none() {
            return Err(ApiError::field("company", "company does not exist"));
        }
    }
    user.apply(patch)?;
    services.stores.users.update(&user).await?;
    tracing::info!(user_id = %user.id, "user updated");
    view(services, &user).await
}
