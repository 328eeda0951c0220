//! Token issue, refresh and revocation, and platform-admin registration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};

use v4vision_auth::{Access, AccessPolicy, NewUser, PlatformAdminOnly, TokenKind, TokenPair};
use v4vision_core::normalize_email;

use crate::app::dto::{AccessResponse, LoginRequest, LogoutRequest, MessageResponse, RefreshRequest, UserView};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::ApiJson;
use crate::app::routes::common::parse_body;
use crate::app::routes::users::company_of;
use crate::app::services::AppServices;
use crate::context::CallerContext;

/// Endpoints reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub fn router() -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/register", post(register))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let rejected = || ApiError::unauthenticated("no active account found with the given credentials");

    let email = normalize_email("email", &body.email).map_err(|_| rejected())?;
    let user = services
        .stores
        .users
        .get_by_email(&email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(rejected)?;
    if !services.verify_password(&body.password, &user.password_hash).await? {
        tracing::debug!(user_id = %user.id, "login rejected: wrong password");
        return Err(rejected());
    }

    let pair = services.tokens.issue_pair(user.id, Utc::now())?;
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(pair))
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> ApiResult<Json<AccessResponse>> {
    let now = Utc::now();
    let claims = services.tokens.decode(&body.refresh, TokenKind::Refresh, now)?;
    if services.stores.revoked_tokens.is_revoked(claims.jti).await? {
        return Err(ApiError::unauthenticated("token has been revoked"));
    }
    let user = services
        .stores
        .users
        .get(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthenticated("user not found or inactive"))?;

    let access = services.tokens.issue(user.id, TokenKind::Access, now)?;
    Ok(Json(AccessResponse { access }))
}

/// Revoke the caller's refresh token. Without one there is nothing to do.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Option<ApiJson<LogoutRequest>>,
) -> ApiResult<Json<MessageResponse>> {
    let done = Json(MessageResponse {
        message: "Logout realizado com sucesso.",
    });
    let Some(token) = body.and_then(|ApiJson(b)| b.refresh) else {
        return Ok(done);
    };

    let now = Utc::now();
    let claims = services
        .tokens
        .decode(&token, TokenKind::Refresh, now)
        .map_err(|e| {
            tracing::debug!(error = %e, "logout with unusable token");
            ApiError::invalid_token()
        })?;
    if claims.sub != caller.user().id {
        return Err(ApiError::invalid_token());
    }

    let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(now);
    services.stores.revoked_tokens.revoke(claims.jti, expires_at).await?;
    tracing::info!(user_id = %claims.sub, jti = %claims.jti, "refresh token revoked");
    Ok(done)
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    PlatformAdminOnly.has_permission(Some(caller.identity()), Access::Write)?;

    let input: NewUser = parse_body(body)?;
    let user = services.register_user(input).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user registered");

    let company = company_of(&services, &user).await?;
    Ok((StatusCode::CREATED, Json(UserView::new(&user, company.as_ref()))))
}
