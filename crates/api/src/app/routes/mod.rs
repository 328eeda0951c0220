use axum::Router;

pub mod auth;
pub mod common;
pub mod companies;
pub mod estrategias;
pub mod gestao_semanal;
pub mod protocolos;
pub mod receitas;
pub mod system;
pub mod users;
pub mod vendas_vendedor;
pub mod vendedores;

/// Routes under `/api` that need no bearer token.
pub fn public_router() -> Router {
    Router::new().nest("/auth", auth::public_router())
}

/// Routes under `/api` that require an authenticated caller.
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/companies", companies::router())
        .nest("/users", users::router())
        .nest("/vendedores", vendedores::router())
        .nest("/receitas", receitas::router())
        .nest("/vendas-vendedor", vendas_vendedor::router())
        .nest("/estrategias", estrategias::router())
        .nest("/gestao-semanal", gestao_semanal::router())
        .nest("/protocolos", protocolos::router())
}
