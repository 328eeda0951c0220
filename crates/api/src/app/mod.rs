//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage backend, token codec, password hasher
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `extract.rs`: JSON/query extractors with JSON rejections
//! - `errors.rs`: consistent error responses

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::Uri,
    routing::get,
    Extension, Router, ServiceExt,
};
use tokio::net::TcpListener;
use tower::Layer;
use tower::util::{MapRequest, MapRequestLayer};

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use services::AppServices;

/// The router wrapped so that `/api/receitas/` and `/api/receitas` match the
/// same route.
pub type App = MapRequest<Router, fn(Request) -> Request>;

/// Build the services described by `config` and create the bootstrap admin.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<Arc<AppServices>> {
    let services = AppServices::from_config(config).await?;
    if let Some(admin) = &config.bootstrap_admin {
        services.bootstrap_admin(admin).await?;
    }
    Ok(Arc::new(services))
}

/// Build the full HTTP application (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> App {
    // Protected routes: require a valid access token and an active user.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::auth_middleware,
    ));

    let api = routes::public_router()
        .merge(protected)
        .layer(Extension(services));

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(middleware::trace_requests));

    MapRequestLayer::new(strip_trailing_slash as fn(Request) -> Request).layer(router)
}

pub async fn serve(
    listener: TcpListener,
    app: App,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown)
        .await
}

fn strip_trailing_slash(mut req: Request) -> Request {
    let path = req.uri().path();
    if path.len() <= 1 || !path.ends_with('/') {
        return req;
    }

    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    let rebuilt = match req.uri().query() {
        Some(query) => format!("{trimmed}?{query}"),
        None => trimmed.to_string(),
    };
    match rebuilt.parse::<Uri>() {
        Ok(uri) => *req.uri_mut() = uri,
        Err(e) => tracing::debug!(error = %e, "could not normalise request path"),
    }
    req
}
