//! Contrato de persistencia que consume el servicio de la cola

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{NewUser, ProcessState, User, Vehicle};
use crate::services::queue_engine::Sequences;
use crate::utils::errors::AppResult;

/// Almacenamiento de usuarios y vehículos
///
/// Las implementaciones deben poder usarse desde varias tareas a la vez.
#[async_trait]
pub trait QueueStore: Send + Sync {
    // Usuarios

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Cambiar el flag de administrador; `None` si el usuario no existe
    async fn set_user_admin(&self, username: &str, admin: bool) -> AppResult<Option<User>>;

    // Conteos

    async fn count_vehicles_for_owner(&self, owner_id: i64) -> AppResult<i64>;

    async fn count_vehicles_for_date(&self, date: NaiveDate) -> AppResult<i64>;

    /// Reservar de forma atómica la secuencia del dueño y la posición del día
    ///
    /// Los contadores solo crecen: un número reservado nunca se vuelve a
    /// entregar, aunque el vehículo se borre o la inserción falle.
    async fn allocate_sequences(&self, owner_id: i64, date: NaiveDate) -> AppResult<Sequences>;

    // Vehículos

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> AppResult<()>;

    async fn find_vehicle_by_id(&self, id: &str) -> AppResult<Option<Vehicle>>;

    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<()>;

    /// Devuelve `false` si no existía
    async fn delete_vehicle(&self, id: &str) -> AppResult<bool>;

    /// Vehículos en un estado; con `date` solo los registrados ese día
    async fn find_vehicles_by_state(
        &self,
        state: ProcessState,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<Vehicle>>;

    async fn find_vehicles_by_owner_username(&self, username: &str) -> AppResult<Vec<Vehicle>>;
}
