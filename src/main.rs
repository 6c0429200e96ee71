use anyhow::Result;
use dotenvy::dotenv;
use tracing::{error, info, warn};

use carwash_queue::config::environment::{EnvironmentConfig, StoreKind};
use carwash_queue::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    info!("🚿 Cola de lavado");
    info!("================");

    let config = match EnvironmentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuración inválida: {}", e);
            return Err(anyhow::anyhow!("Error de configuración: {}", e));
        }
    };

    info!("🌍 Entorno: {}", config.environment);
    if config.is_development() {
        info!("🛠️ Modo desarrollo: almacenamiento {:?}", config.store);
    }
    if config.is_production() && config.store == StoreKind::Memory {
        warn!("⚠️ Producción con almacenamiento en memoria: los datos se pierden al reiniciar");
    }
    for (package, minutes) in config.packages.packages() {
        info!("   {} - {} min", package, minutes);
    }

    let state = match AppState::from_config(config).await {
        Ok(state) => state,
        Err(e) => {
            error!("❌ Error inicializando el almacenamiento: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let admins = state.promote_admins().await.map_err(|e| {
        error!("❌ No se pudieron asignar administradores: {}", e);
        anyhow::anyhow!("Error asignando administradores: {}", e)
    })?;
    if admins > 0 {
        info!("🔑 {} administradores activos", admins);
    }

    // El tablero va a stdout como JSON; los logs van a stderr
    let board = state.queue_board().await.map_err(|e| {
        error!("❌ No se pudo armar el tablero: {}", e);
        anyhow::anyhow!(serde_json::to_string(&e.to_response()).unwrap_or_else(|_| e.to_string()))
    })?;
    println!("{}", serde_json::to_string_pretty(&board)?);

    info!("👋 Tablero del {} listo ({} vehículos registrados)", board.date, board.registered);
    Ok(())
}
