//! Configuración de conexión a SQLite
//!
//! Este módulo abre el pool y crea el schema si todavía no existe.

use sqlx::{Executor, SqlitePool};
use tracing::{debug, info};

use crate::config::database::DatabaseConfig;
use crate::utils::errors::AppResult;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        admin INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vehicles (
        id TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        queue INTEGER NOT NULL,
        name TEXT NOT NULL,
        package TEXT NOT NULL,
        plate TEXT NOT NULL,
        contact TEXT NOT NULL DEFAULT '',
        process TEXT NOT NULL,
        date TEXT NOT NULL,
        enter_time TEXT NOT NULL,
        estimated_time TEXT NOT NULL,
        finish_time TEXT
    );

    -- Contadores monótonos: scope = 'owner' (clave = user id) o 'day' (clave = fecha)
    CREATE TABLE IF NOT EXISTS queue_counters (
        scope TEXT NOT NULL,
        scope_key TEXT NOT NULL,
        value INTEGER NOT NULL,
        PRIMARY KEY (scope, scope_key)
    );

    CREATE INDEX IF NOT EXISTS idx_vehicles_date_process ON vehicles(date, process);
    CREATE INDEX IF NOT EXISTS idx_vehicles_user ON vehicles(user_id);
"#;

/// Tablas que debe tener una base migrada
const TABLES: [&str; 3] = ["users", "vehicles", "queue_counters"];

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    /// Conectar y migrar si hace falta
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        info!("🗄️ Conectando a la base de datos: {}", mask_database_url(&config.url));
        let pool = config.create_pool().await?;
        Self::prepare(pool).await
    }

    /// Base de datos en memoria, ya migrada
    pub async fn new_test() -> AppResult<Self> {
        let pool = DatabaseConfig::create_test_pool().await?;
        Self::prepare(pool).await
    }

    async fn prepare(pool: SqlitePool) -> AppResult<Self> {
        if tables_exist(&pool).await? {
            debug!("Schema ya presente");
        } else {
            info!("📦 Tablas no encontradas, ejecutando migración");
            run_migrations(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Verificar que existen todas las tablas
pub async fn tables_exist(pool: &SqlitePool) -> AppResult<bool> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?, ?, ?)",
    )
    .bind(TABLES[0])
    .bind(TABLES[1])
    .bind(TABLES[2])
    .fetch_one(pool)
    .await?;

    Ok(found == TABLES.len() as i64)
}

/// Ejecutar migraciones de la base de datos (idempotente)
pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    pool.execute(SCHEMA).await?;
    info!("✅ Migración de base de datos completada");
    Ok(())
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.find('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
