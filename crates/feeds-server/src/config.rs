use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use feeds_api::ServiceConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub owner_did: String,
    pub owner_name: String,
    pub service_did: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("FEEDS_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FEEDS_JWT_SECRET is unset or still a placeholder");
        }

        let owner_did = lookup("FEEDS_OWNER_DID").unwrap_or_default();
        if owner_did.is_empty() {
            bail!("FEEDS_OWNER_DID is unset");
        }

        let port = var("FEEDS_PORT", "10018");
        let port: u16 = port
            .parse()
            .with_context(|| format!("FEEDS_PORT is not a port number: {port}"))?;

        Ok(Self {
            host: var("FEEDS_HOST", "0.0.0.0"),
            port,
            db_path: var("FEEDS_DB_PATH", "feeds.db").into(),
            jwt_secret,
            owner_name: var("FEEDS_OWNER_NAME", "owner"),
            service_did: var("FEEDS_SERVICE_DID", &owner_did),
            owner_did,
        })
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            jwt_secret: self.jwt_secret.clone(),
            owner_did: self.owner_did.clone(),
            owner_name: self.owner_name.clone(),
            service_did: self.service_did.clone(),
        }
    }
}
