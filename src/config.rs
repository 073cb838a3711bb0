use anyhow::{bail, Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Which record store backs the service.
///
/// Postgres is the production backend; the in-memory store exists for local
/// development without a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("Unknown STORE_BACKEND '{other}' (expected 'postgres' or 'memory')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Record store
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Identity service tokens
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,

    // Identity service proxy (register/login)
    pub identity_service_url: String,
    pub identity_timeout_seconds: u64,

    // Evaluation policy: require the awarded bid to match the
    // lowest-price recommendation instead of allowing evaluator override.
    pub award_requires_lowest: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        // Record store
        let store_backend = StoreBackend::from_str(
            &env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string()),
        )?;
        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND=postgres");
        }
        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // CORS
        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Identity service tokens
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let jwt_issuer = env::var("JWT_ISSUER").context("JWT_ISSUER must be set")?;
        let jwt_audience = env::var("JWT_AUDIENCE").unwrap_or_else(|_| "tenderdesk".to_string());

        // Identity service proxy
        let identity_service_url = env::var("IDENTITY_SERVICE_URL")
            .unwrap_or_else(|_| "http://identity:8081".to_string());
        let identity_timeout_seconds = env::var("IDENTITY_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Evaluation policy
        let award_requires_lowest = env::var("AWARD_REQUIRES_LOWEST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Ok(Settings {
            env,
            server_addr,
            store_backend,
            database_url,
            database_max_connections,
            cors_allow_origins,
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            identity_service_url,
            identity_timeout_seconds,
            award_requires_lowest,
        })
    }
}
