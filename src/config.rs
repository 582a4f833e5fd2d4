use anyhow::{Context, Result};
use chrono::Duration;
use config::{Config, Environment, File};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{PasswordHasher, TokenService};
use crate::schemas::AppState;

const DEFAULT_JWT_SECRET: &str = "secret";

/// Runtime settings, layered from defaults, an optional `pizza.toml`
/// and the process environment (after `.env` has been loaded).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret_key: String,
    pub access_token_expires_minutes: i64,
    pub refresh_token_expires_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", "sqlite://pizza.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret_key", DEFAULT_JWT_SECRET)?
            .set_default("access_token_expires_minutes", 30_i64)?
            .set_default("refresh_token_expires_minutes", 10_i64)?
            .set_default("bcrypt_cost", i64::from(bcrypt::DEFAULT_COST))?
            .add_source(File::with_name("pizza").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to assemble configuration")?;

        let settings: Settings = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        if settings.jwt_secret_key == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET_KEY is not set, tokens are signed with the default secret");
        }

        Ok(settings)
    }

    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }

    pub fn token_service(&self) -> TokenService {
        TokenService::new(
            self.jwt_secret_key.clone(),
            Duration::minutes(self.access_token_expires_minutes),
            Duration::minutes(self.refresh_token_expires_minutes),
        )
    }

    pub fn password_hasher(&self) -> PasswordHasher {
        PasswordHasher::new(self.bcrypt_cost)
    }
}

/// Connect to the database and build the shared application state
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", settings.database_url))?;

    Ok(AppState {
        db,
        tokens: settings.token_service(),
        passwords: settings.password_hasher(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:3000".to_string(),
            jwt_secret_key: "test".to_string(),
            access_token_expires_minutes: 30,
            refresh_token_expires_minutes: 10,
            bcrypt_cost: 4,
        }
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let overridden = settings().with_overrides(None, Some("0.0.0.0:8080".to_string()));
        assert_eq!(overridden.database_url, "sqlite::memory:");
        assert_eq!(overridden.bind_address, "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_initialize_app_state() {
        let state = initialize_app_state(&settings()).await.unwrap();
        assert!(state.db.ping().await.is_ok());
    }
}
