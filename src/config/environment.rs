//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::config::database::DatabaseConfig;
use crate::config::packages::PackageCatalog;
use crate::models::ProcessLabels;
use crate::services::queue_engine::FinishTimePolicy;
use crate::services::vehicle_service::BoardScope;
use crate::utils::errors::{AppError, AppResult};

/// Dónde se guardan usuarios y vehículos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(AppError::Config(format!(
                "DB must be 'sqlite' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub store: StoreKind,
    pub database: DatabaseConfig,
    pub packages: PackageCatalog,
    pub process_labels: ProcessLabels,
    pub finish_time_policy: FinishTimePolicy,
    pub board_scope: BoardScope,
    pub password_cost: u32,
    /// Usuarios promovidos a administrador al arrancar
    pub admin_usernames: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            store: StoreKind::Sqlite,
            database: DatabaseConfig::default(),
            packages: PackageCatalog::default(),
            process_labels: ProcessLabels::default(),
            finish_time_policy: FinishTimePolicy::default(),
            board_scope: BoardScope::Today,
            password_cost: bcrypt::DEFAULT_COST,
            admin_usernames: Vec::new(),
        }
    }
}

/// Leer una variable opcional y parsearla, con valor por defecto
fn env_or<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Lista separada por comas, sin vacíos ni repetidos
fn parse_usernames(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

impl EnvironmentConfig {
    /// Cargar la configuración desde el entorno
    ///
    /// `DB` es obligatoria; el resto tiene valores por defecto.
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let store = env::var("DB")
            .map_err(|_| AppError::Config("No database found, set the DB env".to_string()))?
            .parse()?;

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.database.min_connections)?,
            connect_timeout: Duration::from_secs(env_or(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.database.connect_timeout.as_secs(),
            )?),
            ..defaults.database
        };

        let process_labels = match env::var("PROCESS_LABELS") {
            Ok(raw) => ProcessLabels::from_csv(&raw)?,
            Err(_) => defaults.process_labels,
        };

        let password_cost = env_or("BCRYPT_COST", defaults.password_cost)?;
        if !(4..=31).contains(&password_cost) {
            return Err(AppError::Config(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                password_cost
            )));
        }

        let admin_usernames = env::var("ADMIN_USERNAMES")
            .map(|raw| parse_usernames(&raw))
            .unwrap_or_default();

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            store,
            database,
            packages: PackageCatalog::from_env()?,
            process_labels,
            finish_time_policy: env_or("FINISH_TIME_POLICY", defaults.finish_time_policy)?,
            board_scope: env_or("BOARD_SCOPE", defaults.board_scope)?,
            password_cost,
            admin_usernames,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
