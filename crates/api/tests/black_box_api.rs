use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use v4vision_api::ApiConfig;
use v4vision_api::config::BootstrapAdmin;
use v4vision_auth::{JwtClaims, TokenKind};
use v4vision_core::UserId;

const JWT_SECRET: &str = "test-secret";
const ROOT_EMAIL: &str = "root@v4.test";
const ROOT_PASSWORD: &str = "root-pass-1";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same app as prod, in-memory stores, cheap hashing, ephemeral port.
        let config = ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            bootstrap_admin: Some(BootstrapAdmin {
                email: ROOT_EMAIL.to_string(),
                password: ROOT_PASSWORD.to_string(),
            }),
            password_hash_memory_kib: 64,
            ..ApiConfig::default()
        };
        let services = v4vision_api::app::build_services(&config)
            .await
            .expect("failed to build services");
        let app = v4vision_api::app::build_app(services);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            v4vision_api::app::serve(listener, app, std::future::pending())
                .await
                .unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> Value {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "login failed for {email}");
        res.json().await.unwrap()
    }

    async fn root_token(&self) -> String {
        self.login(ROOT_EMAIL, ROOT_PASSWORD).await["access"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn send(&self, method: reqwest::Method, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, token, path, body).await
    }

    async fn create_company(&self, root: &str, slug: &str) -> String {
        let (status, body) = self
            .post(root, "/api/companies", json!({"name": slug.to_uppercase(), "slug": slug}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Register a user and return an access token for them.
    async fn user_token(&self, root: &str, email: &str, role: &str, company: Option<&str>) -> String {
        let (status, body) = self
            .post(
                root,
                "/api/auth/register",
                json!({
                    "email": email,
                    "password": "password-1",
                    "password_confirm": "password-1",
                    "first_name": "Test",
                    "role": role,
                    "company": company,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        self.login(email, "password-1").await["access"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: UserId) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        token_type: TokenKind::Access,
        jti: Uuid::now_v7(),
        iat: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn revenue(ano: u32, mes: u8, receita: &str, investimento: &str) -> Value {
    json!({"ano": ano, "mes": mes, "receita": receita, "investimento": investimento, "leads": 10})
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/receitas")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthenticated");

    // Wrong signature.
    let forged = mint_jwt("other-secret", UserId::new());
    let (status, _) = srv.get(&forged, "/api/receitas").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid signature, unknown user.
    let orphan = mint_jwt(JWT_SECRET, UserId::new());
    let (status, _) = srv.get(&orphan, "/api/receitas").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_refresh_and_logout_revocation() {
    let srv = TestServer::spawn().await;

    let bad = srv
        .client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": ROOT_EMAIL, "password": "nope-nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    let pair = srv.login(" ROOT@v4.test ", ROOT_PASSWORD).await;
    let access = pair["access"].as_str().unwrap().to_string();
    let refresh = pair["refresh"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url("/api/auth/refresh"))
        .json(&json!({"refresh": refresh}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["access"].is_string());

    // An access token is not a refresh token.
    let res = srv
        .client
        .post(srv.url("/api/auth/refresh"))
        .json(&json!({"refresh": access}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = srv.post(&access, "/api/auth/logout", json!({"refresh": "garbage"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_token");

    let (status, body) = srv.post(&access, "/api/auth/logout", json!({"refresh": refresh})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let res = srv
        .client
        .post(srv.url("/api/auth/refresh"))
        .json(&json!({"refresh": refresh}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // No refresh token: nothing to revoke.
    let (status, _) = srv.post(&access, "/api/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tenants_only_see_their_own_rows() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let b = srv.create_company(&root, "beta").await;
    let admin_a = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let admin_b = srv.user_token(&root, "admin@beta.com", "company_admin", Some(&b)).await;

    let (status, row_a) = srv.post(&admin_a, "/api/receitas", revenue(2025, 1, "100", "50")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row_a["company"], a.as_str());

    // A foreign `company` in the body is ignored for tenant users.
    let mut body = revenue(2025, 1, "999", "1");
    body["company"] = json!(a);
    let (status, row_b) = srv.post(&admin_b, "/api/receitas", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(row_b["company"], b.as_str());

    let (_, list_a) = srv.get(&admin_a, "/api/receitas").await;
    let list_a = list_a.as_array().unwrap();
    assert_eq!(list_a.len(), 1);
    assert_eq!(list_a[0]["id"], row_a["id"]);

    // `?company=` is ignored for tenant users.
    let (_, still_a) = srv.get(&admin_a, &format!("/api/receitas?company={b}")).await;
    assert_eq!(still_a.as_array().unwrap().len(), 1);

    let (status, _) = srv
        .get(&admin_a, &format!("/api/receitas/{}", row_b["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) = srv.get(&root, "/api/receitas").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, only_b) = srv.get(&root, &format!("/api/receitas?company={b}")).await;
    let only_b = only_b.as_array().unwrap();
    assert_eq!(only_b.len(), 1);
    assert_eq!(only_b[0]["company"], b.as_str());

    // Companies are scoped the same way.
    let (_, companies) = srv.get(&admin_a, "/api/companies").await;
    assert_eq!(companies.as_array().unwrap().len(), 1);
    let (status, _) = srv.get(&admin_a, "/api/companies/beta").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewers_cannot_write() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let viewer = srv.user_token(&root, "viewer@alpha.com", "viewer", Some(&a)).await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (status, body) = srv.post(&viewer, "/api/vendedores", json!({"nome": "Ana"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, created) = srv.post(&admin, "/api/vendedores", json!({"nome": "Ana"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();

    let (status, _) = srv
        .send(reqwest::Method::PATCH, &viewer, &format!("/api/vendedores/{id}"), json!({"nome": "Bia"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = srv.get(&viewer, "/api/vendedores").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Users are not listable by viewers.
    let (status, _) = srv.get(&viewer, "/api/users").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_revenue_month_conflicts() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (status, _) = srv.post(&admin, "/api/receitas", revenue(2025, 4, "10", "0")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = srv.post(&admin, "/api/receitas", revenue(2025, 4, "20", "0")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv.post(&admin, "/api/receitas", revenue(2025, 13, "20", "0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = srv.post(&admin, "/api/receitas", revenue(2025, 5, "-1", "0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn annual_summary_and_salesperson_comparison() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    for (mes, receita) in [(1, "100"), (2, "150"), (3, "200")] {
        let (status, _) = srv.post(&admin, "/api/receitas", revenue(2025, mes, receita, "50")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = srv.get(&admin, "/api/receitas/retrospectiva?ano=2025").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["receita_total"], 450.0);
    assert_eq!(summary["investimento_total"], 150.0);
    assert_eq!(summary["roas_global"], 3.0);
    assert_eq!(summary["mes_pico"]["mes"], 3);
    assert_eq!(summary["receitas_mensais"].as_array().unwrap().len(), 3);
    assert_eq!(summary["receitas_mensais"][0]["mes"], 1);

    let (_, ana) = srv.post(&admin, "/api/vendedores", json!({"nome": "Ana"})).await;
    let (_, bruno) = srv.post(&admin, "/api/vendedores", json!({"nome": "Bruno"})).await;
    for (who, mes, valor) in [(&ana, 1, "100"), (&ana, 2, "50"), (&bruno, 1, "300")] {
        let (status, body) = srv
            .post(
                &admin,
                "/api/vendas-vendedor",
                json!({"vendedor": who["id"], "ano": 2025, "mes": mes, "valor": valor}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, rows) = srv.get(&admin, "/api/receitas/comparativo_vendedores?ano=2025").await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["vendedor"], "Bruno");
    assert_eq!(rows[0]["total"], 300.0);
    assert_eq!(rows[1]["total"], 150.0);

    let (_, sellers) = srv.get(&admin, "/api/vendedores").await;
    let ana_view = sellers
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["nome"] == "Ana")
        .unwrap()
        .clone();
    assert_eq!(ana_view["total_vendas"], 150.0);
}

#[tokio::test]
async fn set_investimentos_replaces_the_whole_plan() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (status, strategy) = srv
        .post(
            &admin,
            "/api/estrategias",
            json!({
                "ano": 2025,
                "orcamento_total": "1000",
                "receita_projetada": "5000",
                "investimentos": [{"mes": 1, "valor": "100"}, {"mes": 2, "valor": "200"}],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{strategy}");
    assert_eq!(strategy["cenario"], "conservador");
    assert_eq!(strategy["investimentos_mensais"].as_array().unwrap().len(), 2);
    let path = format!("/api/estrategias/{}/set_investimentos", strategy["id"].as_str().unwrap());

    let (status, updated) = srv
        .post(&admin, &path, json!({"investimentos": [{"mes": 6, "valor": "600"}]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let plan = updated["investimentos_mensais"].as_array().unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0]["mes"], 6);

    // A rejected list leaves the stored plan untouched.
    let (status, _) = srv
        .post(
            &admin,
            &path,
            json!({"investimentos": [{"mes": 3, "valor": "1"}, {"mes": 3, "valor": "2"}]}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, current) = srv
        .get(&admin, &format!("/api/estrategias/{}", strategy["id"].as_str().unwrap()))
        .await;
    assert_eq!(current["investimentos_mensais"][0]["mes"], 6);
}

#[tokio::test]
async fn trailing_slashes_are_accepted() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;

    let (status, _) = srv.get(&root, "/api/receitas/").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv.get(&root, "/api/users/me/").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn platform_admin_creates_for_a_named_company() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;

    // The bootstrap admin has no company of its own.
    let (status, body) = srv.post(&root, "/api/protocolos", json!({"tipo": "sla", "titulo": "SLA", "descricao": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv
        .post(
            &root,
            "/api/protocolos",
            json!({"company": Uuid::now_v7().to_string(), "tipo": "sla", "titulo": "SLA", "descricao": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["company"].is_array());

    let (status, body) = srv
        .post(
            &root,
            "/api/protocolos",
            json!({"company": a, "tipo": "sla", "titulo": "Responder em 5 minutos", "descricao": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["company"], a.as_str());
    assert_eq!(body["tipo_nome"], "SLA");
    assert_eq!(body["cor"], "orange");
}

#[tokio::test]
async fn deleting_a_salesperson_removes_their_sales() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let b = srv.create_company(&root, "beta").await;
    let admin_a = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let admin_b = srv.user_token(&root, "admin@beta.com", "company_admin", Some(&b)).await;

    let (_, ana) = srv.post(&admin_a, "/api/vendedores", json!({"nome": "Ana"})).await;
    let sale = json!({"vendedor": ana["id"], "ano": 2025, "mes": 1, "valor": "10"});

    // Another tenant cannot book sales against this salesperson.
    let (status, body) = srv.post(&admin_b, "/api/vendas-vendedor", sale.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["vendedor"].is_array());

    let (status, _) = srv.post(&admin_a, "/api/vendas-vendedor", sale).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = srv
        .send(
            reqwest::Method::DELETE,
            &admin_a,
            &format!("/api/vendedores/{}", ana["id"].as_str().unwrap()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, sales) = srv.get(&admin_a, "/api/vendas-vendedor").await;
    assert!(sales.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_updates_cannot_escalate() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let viewer = srv.user_token(&root, "viewer@alpha.com", "viewer", Some(&a)).await;

    let (status, me) = srv
        .send(
            reqwest::Method::PATCH,
            &viewer,
            "/api/users/me",
            json!({"first_name": "Vera", "role": "platform_admin", "company": null}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["first_name"], "Vera");
    assert_eq!(me["role"], "viewer");
    assert_eq!(me["company"], a.as_str());
    assert_eq!(me["company_data"]["slug"], "alpha");
    assert_eq!(me["can_edit"], false);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let token = srv.user_token(&root, "viewer@alpha.com", "viewer", Some(&a)).await;

    let (status, body) = srv
        .post(
            &token,
            "/api/users/change_password",
            json!({"old_password": "wrong-one", "new_password": "new-password-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["old_password"].is_array());

    let (status, _) = srv
        .post(
            &token,
            "/api/users/change_password",
            json!({"old_password": "password-1", "new_password": "new-password-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    srv.login("viewer@alpha.com", "new-password-1").await;
}

#[tokio::test]
async fn deleting_a_company_cascades() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let (status, _) = srv.post(&admin, "/api/receitas", revenue(2025, 1, "1", "1")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, company) = srv.get(&root, "/api/companies/alpha").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(company["users_count"], 1);

    let (status, _) = srv
        .send(reqwest::Method::DELETE, &root, "/api/companies/alpha", json!({}))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, rows) = srv.get(&root, "/api/receitas").await;
    assert!(rows.as_array().unwrap().is_empty());
    // The company admin went with the company.
    let (status, _) = srv.get(&admin, "/api/users/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_investimentos_without_a_list_clears_the_plan() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (status, strategy) = srv
        .post(
            &admin,
            "/api/estrategias",
            json!({
                "ano": 2025,
                "orcamento_total": "1000",
                "receita_projetada": "5000",
                "investimentos": [{"mes": 1, "valor": "100"}],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let path = format!("/api/estrategias/{}/set_investimentos", strategy["id"].as_str().unwrap());

    let (status, updated) = srv.post(&admin, &path, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert!(updated["investimentos_mensais"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_path_ids_are_not_found() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;

    let (status, body) = srv.get(&root, "/api/receitas/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, _) = srv
        .send(reqwest::Method::DELETE, &root, "/api/vendedores/not-a-uuid", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = srv.get(&root, "/api/users/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn company_filter_is_ignored_for_tenant_users() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let viewer = srv.user_token(&root, "viewer@alpha.com", "viewer", Some(&a)).await;
    let (status, _) = srv.post(&admin, "/api/receitas", revenue(2025, 1, "100", "50")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, rows) = srv.get(&viewer, "/api/receitas?company=garbage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let (status, summary) = srv
        .get(&viewer, "/api/receitas/retrospectiva?ano=2025&company=garbage")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["receita_total"], 100.0);

    let (status, _) = srv
        .get(&viewer, "/api/receitas/comparativo_vendedores?company=garbage")
        .await;
    assert_eq!(status, StatusCode::OK);

    // Platform admins do pick a company, so theirs must parse.
    let (status, body) = srv.get(&root, "/api/receitas?company=garbage").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["company"].is_array());
}

#[tokio::test]
async fn invalid_amounts_report_their_field() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (status, body) = srv.post(&admin, "/api/receitas", revenue(2025, 1, "100", "-5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["investimento"].is_array(), "{body}");

    let (_, row) = srv.post(&admin, "/api/receitas", revenue(2025, 1, "100", "5")).await;
    let (status, body) = srv
        .send(
            reqwest::Method::PATCH,
            &admin,
            &format!("/api/receitas/{}", row["id"].as_str().unwrap()),
            json!({"receita": "1.001"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["receita"].is_array(), "{body}");
}

#[tokio::test]
async fn foreign_rows_cannot_be_changed_or_deleted() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let b = srv.create_company(&root, "beta").await;
    let admin_a = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let admin_b = srv.user_token(&root, "admin@beta.com", "company_admin", Some(&b)).await;

    let (_, row) = srv.post(&admin_a, "/api/receitas", revenue(2025, 1, "100", "50")).await;
    let path = format!("/api/receitas/{}", row["id"].as_str().unwrap());

    let (status, _) = srv
        .send(reqwest::Method::PATCH, &admin_b, &path, json!({"receita": "1"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = srv.send(reqwest::Method::DELETE, &admin_b, &path, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, unchanged) = srv.get(&admin_a, &path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["receita"], "100.00");
}

#[tokio::test]
async fn viewers_cannot_delete() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;
    let viewer = srv.user_token(&root, "viewer@alpha.com", "viewer", Some(&a)).await;

    let (_, protocol) = srv
        .post(&admin, "/api/protocolos", json!({"tipo": "foco", "titulo": "Foco", "descricao": "x"}))
        .await;
    let path = format!("/api/protocolos/{}", protocol["id"].as_str().unwrap());

    let (status, body) = srv.send(reqwest::Method::DELETE, &viewer, &path, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = srv.get(&viewer, &path).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn put_requires_the_full_payload() {
    let srv = TestServer::spawn().await;
    let root = srv.root_token().await;
    let a = srv.create_company(&root, "alpha").await;
    let admin = srv.user_token(&root, "admin@alpha.com", "company_admin", Some(&a)).await;

    let (_, week) = srv
        .post(
            &admin,
            "/api/gestao-semanal",
            json!({"ano": 2025, "mes": 5, "semana": 1, "investimento": "100", "leads": 10, "vendas": "300"}),
        )
        .await;
    let path = format!("/api/gestao-semanal/{}", week["id"].as_str().unwrap());

    let (status, _) = srv
        .send(reqwest::Method::PUT, &admin, &path, json!({"vendas": "400"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, replaced) = srv
        .send(
            reqwest::Method::PUT,
            &admin,
            &path,
            json!({"ano": 2025, "mes": 5, "semana": 2, "investimento": "200", "leads": 12, "vendas": "400"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["semana"], 2);
    assert_eq!(replaced["vendas"], "400.00");
    assert_eq!(replaced["roas"], 2.0);
}
