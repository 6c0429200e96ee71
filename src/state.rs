//! Estado compartido de la aplicación
//!
//! Este módulo define el estado compartido de la aplicación: la
//! configuración y los servicios construidos sobre el almacenamiento elegido.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::environment::{EnvironmentConfig, StoreKind};
use crate::database::DatabaseConnection;
use crate::dto::QueueBoardResponse;
use crate::models::ProcessState;
use crate::repositories::{MemoryStore, QueueStore, SqlStore};
use crate::services::{Clock, SystemClock, UserService, VehicleService};
use crate::utils::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub vehicles: Arc<VehicleService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>) -> Self {
        let vehicles = VehicleService::new(
            store.clone(),
            Arc::new(config.packages.clone()),
            clock,
            config.finish_time_policy,
        );
        let users = UserService::new(store, config.password_cost);

        Self {
            config,
            vehicles: Arc::new(vehicles),
            users: Arc::new(users),
        }
    }

    /// Abrir el almacenamiento indicado por `DB` y usar el reloj del sistema
    pub async fn from_config(config: EnvironmentConfig) -> AppResult<Self> {
        let store: Arc<dyn QueueStore> = match config.store {
            StoreKind::Sqlite => {
                let connection = DatabaseConnection::new(&config.database).await?;
                Arc::new(SqlStore::new(connection.pool().clone()))
            }
            StoreKind::Memory => {
                info!("⚠️ Usando almacenamiento en memoria, los datos no persisten");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config, store, Arc::new(SystemClock)))
    }

    /// Promover a los usuarios de `ADMIN_USERNAMES`; los que aún no existen
    /// se saltan. Devuelve cuántos quedaron como administradores.
    pub async fn promote_admins(&self) -> AppResult<usize> {
        let mut promoted = 0;
        for username in &self.config.admin_usernames {
            match self.users.grant_admin(username).await {
                Ok(_) => promoted += 1,
                Err(AppError::NotFound(_)) => {
                    warn!("⚠️ ADMIN_USERNAMES incluye a {}, que no está registrado", username);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(promoted)
    }

    /// Tablero de la cola con todos los estados, según el alcance configurado
    pub async fn queue_board(&self) -> AppResult<QueueBoardResponse> {
        let today = self.vehicles.today();
        let groups = self
            .vehicles
            .list_by_state(&ProcessState::ALL, self.config.board_scope)
            .await?;
        let registered = self.vehicles.registered_on(today).await?;

        Ok(QueueBoardResponse::new(
            today,
            registered,
            &groups,
            &self.config.process_labels,
        ))
    }
}
