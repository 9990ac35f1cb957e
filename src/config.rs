//! Carga y gestión de configuración de la inicialización (MongoDB + usuario de aplicación).

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "sentiment_uam_nlp";
pub const DEFAULT_APP_USER: &str = "sentiment_admin";
pub const DEFAULT_APP_PASSWORD: &str = "dev_password_2024";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Configuración completa de la inicialización.
#[derive(Clone)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub database: String,
    pub app_user: String,
    pub app_password: String,
    pub server_selection_timeout: Duration,
    pub seed: bool,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo de una función arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let timeout_ms = match lookup("MONGO_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("MONGO_TIMEOUT_MS no es un número válido: {raw}"))?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            mongo_uri: var_or("MONGO_URI", DEFAULT_MONGO_URI),
            database: var_or("MONGO_DB", DEFAULT_DATABASE),
            app_user: var_or("MONGO_USER", DEFAULT_APP_USER),
            app_password: var_or("MONGO_PASSWORD", DEFAULT_APP_PASSWORD),
            server_selection_timeout: Duration::from_millis(timeout_ms),
            seed: false,
        })
    }
}

// La contraseña nunca aparece en los logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("mongo_uri", &crate::mongo_client::redact_uri(&self.mongo_uri))
            .field("database", &self.database)
            .field("app_user", &self.app_user)
            .field("app_password", &"***")
            .field("server_selection_timeout", &self.server_selection_timeout)
            .field("seed", &self.seed)
            .finish()
    }
}
