//! Service wiring: storage backend, token codec and password hasher.

use std::sync::Arc;

use chrono::Utc;

use v4vision_auth::{NewUser, PasswordHasher, Role, TokenCodec, User};
use v4vision_core::normalize_email;
use v4vision_infra::Stores;

use crate::app::errors::{ApiError, ApiResult};
use crate::config::{ApiConfig, BootstrapAdmin};

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppServices {
    pub stores: Stores,
    pub tokens: TokenCodec,
    pub passwords: Arc<PasswordHasher>,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("stores", &self.stores)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    pub fn new(stores: Stores, config: &ApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            stores,
            tokens: TokenCodec::new(config.jwt_secret.as_bytes(), config.access_ttl, config.refresh_ttl),
            passwords: Arc::new(PasswordHasher::new(config.password_hash_memory_kib)?),
        })
    }

    /// Postgres-backed services when `DATABASE_URL` is configured, in-memory
    /// ones otherwise.
    pub async fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let stores = match &config.database_url {
            Some(url) => {
                tracing::info!("using postgres stores");
                Stores::postgres(url).await?
            }
            None => {
                tracing::info!("DATABASE_URL not set; using in-memory stores");
                Stores::in_memory()
            }
        };
        Self::new(stores, config)
    }

    /// Create the configured platform admin unless that email is taken.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> ApiResult<()> {
        let email = normalize_email("email", &admin.email)?;
        if self.stores.users.get_by_email(&email).await?.is_some() {
            tracing::debug!(%email, "bootstrap admin already present");
            return Ok(());
        }
        let input = NewUser {
            email,
            password: admin.password.clone(),
            password_confirm: admin.password.clone(),
            first_name: String::new(),
            last_name: String::new(),
            company: None,
            role: Role::PlatformAdmin,
        };
        let user = self.register_user(input).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "bootstrap platform admin created");
        Ok(())
    }

    /// Validate, hash and store a new user. The company, when given, must exist.
    pub async fn register_user(&self, input: NewUser) -> ApiResult<User> {
        input.validate()?;
        if let Some(company) = input.company {
            if self.stores.companies.get(company).await?.is_none() {
                return Err(ApiError::field("company", "company does not exist"));
            }
        }
        let hash = self.hash_password(&input.password).await?;
        let user = User::create(input, hash, Utc::now())?;
        self.stores.users.insert(&user).await?;
        Ok(user)
    }

    /// Argon2 runs on the blocking pool.
    pub async fn hash_password(&self, password: &str) -> ApiResult<String> {
        let hasher = Arc::clone(&self.passwords);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
            .map_err(ApiError::from)
    }

    pub async fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        let hasher = Arc::clone(&self.passwords);
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {e}")))?
            .map_err(ApiError::from)
    }
}
