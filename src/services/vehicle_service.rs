//! Servicio del ciclo de vida de los vehículos
//!
//! Orquesta el motor de cola contra el almacenamiento: registro con número
//! de cola, edición, cambios de estado, tablero agrupado y borrado.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::config::PackageCatalog;
use crate::models::{ProcessGroup, ProcessState, User, Vehicle, VehicleForm};
use crate::repositories::QueueStore;
use crate::services::authorization::{
    can_change_process, can_delete_vehicle, can_edit_vehicle, require,
};
use crate::services::queue_engine::{
    estimated_finish, initial_finish_time, transition, truncate_to_minute, vehicle_id, Clock,
    FinishTimePolicy,
};
use crate::utils::errors::{not_found_error, validation_error, AppError, AppResult};

/// Alcance del tablero agrupado por estado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardScope {
    /// Solo los vehículos registrados hoy
    Today,
    /// Todo el historial
    AllDays,
}

impl FromStr for BoardScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(BoardScope::Today),
            "all" | "all_days" => Ok(BoardScope::AllDays),
            other => Err(AppError::Config(format!(
                "BOARD_SCOPE must be 'today' or 'all', got '{}'",
                other
            ))),
        }
    }
}

pub struct VehicleService {
    store: Arc<dyn QueueStore>,
    catalog: Arc<PackageCatalog>,
    clock: Arc<dyn Clock>,
    finish_policy: FinishTimePolicy,
}

impl VehicleService {
    pub fn new(
        store: Arc<dyn QueueStore>,
        catalog: Arc<PackageCatalog>,
        clock: Arc<dyn Clock>,
        finish_policy: FinishTimePolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            finish_policy,
        }
    }

    pub fn finish_policy(&self) -> FinishTimePolicy {
        self.finish_policy
    }

    /// Fecha local de hoy según el reloj del servicio
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    fn check_form(&self, form: &VehicleForm) -> AppResult<u32> {
        form.validate()?;
        if form.plate.trim().is_empty() {
            return Err(validation_error("plate", "La placa no puede estar vacía"));
        }
        self.catalog.duration(&form.package)
    }

    /// Registrar un vehículo nuevo para `owner_id`
    ///
    /// El paquete se valida antes de reservar números, así que un paquete
    /// desconocido no consume secuencia ni escribe nada.
    pub async fn register_vehicle(&self, owner_id: i64, form: VehicleForm) -> AppResult<Vehicle> {
        let duration = self.check_form(&form)?;

        let owner = self
            .store
            .find_user_by_id(owner_id)
            .await?
            .ok_or_else(|| not_found_error("User", &owner_id.to_string()))?;

        let enter_time = truncate_to_minute(self.clock.now());
        let estimated_time = estimated_finish(enter_time, duration)?;
        let date = enter_time.date();

        let sequences = self.store.allocate_sequences(owner.id, date).await?;

        let vehicle = Vehicle {
            id: vehicle_id(&owner.username, sequences.owner_sequence),
            user_id: owner.id,
            owner_username: owner.username,
            queue: sequences.queue_position,
            name: form.name,
            package: form.package,
            plate: form.plate,
            contact: form.contact,
            process: form.process,
            date,
            enter_time,
            estimated_time,
            finish_time: initial_finish_time(form.process, enter_time),
        };

        self.store.insert_vehicle(&vehicle).await?;

        info!(
            "🚗 Vehículo {} registrado en la cola #{} del {} ({} min, paquete {})",
            vehicle.id, vehicle.queue, vehicle.date, duration, vehicle.package
        );
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, id: &str) -> AppResult<Vehicle> {
        self.store
            .find_vehicle_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", id))
    }

    /// Sobrescribe los campos editables; la cola, la fecha, la entrada y el
    /// estimado se mantienen aunque cambie el paquete. Solo administradores.
    pub async fn update_vehicle(
        &self,
        actor: &User,
        id: &str,
        form: VehicleForm,
    ) -> AppResult<Vehicle> {
        require(can_edit_vehicle(actor), "edit vehicle", "admin only")?;
        self.check_form(&form)?;

        let mut vehicle = self.get_vehicle(id).await?;
        let previous = vehicle.process;

        transition(
            vehicle.process,
            form.process,
            vehicle.finish_time,
            self.clock.now(),
            self.finish_policy,
        )
        .apply(&mut vehicle);

        vehicle.name = form.name;
        vehicle.package = form.package;
        vehicle.plate = form.plate;
        vehicle.contact = form.contact;

        self.store.update_vehicle(&vehicle).await?;

        debug!(id = %vehicle.id, from = %previous, to = %vehicle.process, "Vehicle updated");
        Ok(vehicle)
    }

    /// Solo cambia el estado (acciones "pasar a lavado" / "marcar terminado").
    /// Solo administradores.
    pub async fn change_process_state(
        &self,
        actor: &User,
        id: &str,
        new_state: ProcessState,
    ) -> AppResult<Vehicle> {
        require(can_change_process(actor), "change process state", "admin only")?;
        let mut vehicle = self.get_vehicle(id).await?;
        let previous = vehicle.process;

        let step = transition(
            vehicle.process,
            new_state,
            vehicle.finish_time,
            self.clock.now(),
            self.finish_policy,
        );
        step.apply(&mut vehicle);

        self.store.update_vehicle(&vehicle).await?;

        if step.finish_stamp.is_some() {
            info!("🏁 Vehículo {} terminado", vehicle.id);
        }
        debug!(id = %vehicle.id, from = %previous, to = %new_state, "Process state changed");
        Ok(vehicle)
    }

    /// Un grupo por estado pedido, en el mismo orden
    pub async fn list_by_state(
        &self,
        states: &[ProcessState],
        scope: BoardScope,
    ) -> AppResult<Vec<ProcessGroup>> {
        let date = match scope {
            BoardScope::Today => Some(self.today()),
            BoardScope::AllDays => None,
        };

        let lookups = states.iter().map(|state| async move {
            let vehicles = self.store.find_vehicles_by_state(*state, date).await?;
            Ok::<_, AppError>(ProcessGroup {
                process: *state,
                vehicles,
            })
        });

        try_join_all(lookups).await
    }

    pub async fn list_by_owner(&self, username: &str) -> AppResult<Vec<Vehicle>> {
        self.store.find_vehicles_by_owner_username(username).await
    }

    /// Borra un vehículo de su dueño; el resto conserva su cola y su secuencia
    pub async fn delete_vehicle(&self, actor: &User, id: &str) -> AppResult<()> {
        let vehicle = self.get_vehicle(id).await?;
        require(
            can_delete_vehicle(actor, &vehicle),
            "delete vehicle",
            "only the owner can delete it",
        )?;

        if !self.store.delete_vehicle(id).await? {
            warn!("Intento de borrar un vehículo inexistente: {}", id);
            return Err(not_found_error("Vehicle", id));
        }

        info!("🗑️ Vehículo {} eliminado", id);
        Ok(())
    }

    /// Vehículos que siguen registrados en un día
    pub async fn registered_on(&self, day: NaiveDate) -> AppResult<i64> {
        self.store.count_vehicles_for_date(day).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::MemoryStore;
    use crate::services::queue_engine::FixedClock;
    use chrono::NaiveDateTime;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn form(package: &str, process: ProcessState) -> VehicleForm {
        VehicleForm {
            name: "Avanza".to_string(),
            package: package.to_string(),
            plate: "B 1234 XYZ".to_string(),
            contact: "0812".to_string(),
            process,
        }
    }

    // Servicio en memoria con un dueño (alice) y un administrador (staff)
    async fn service_with_users() -> (VehicleService, User, User) {
        let store = Arc::new(MemoryStore::new());
        let new_user = |username: &str, admin: bool| NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            admin,
        };
        let owner = store.insert_user(new_user("alice", false)).await.unwrap();
        let staff = store.insert_user(new_user("staff", true)).await.unwrap();
        let service = VehicleService::new(
            store,
            Arc::new(PackageCatalog::default()),
            Arc::new(FixedClock::new(at(10, 0))),
            FinishTimePolicy::KeepFirst,
        );
        (service, owner, staff)
    }

    #[test]
    fn test_board_scope_from_str() {
        assert_eq!("today".parse::<BoardScope>().unwrap(), BoardScope::Today);
        assert_eq!("ALL".parse::<BoardScope>().unwrap(), BoardScope::AllDays);
        assert!("week".parse::<BoardScope>().is_err());
    }

    #[tokio::test]
    async fn test_whitespace_plate_is_rejected() {
        let (service, owner, _) = service_with_users().await;
        let mut bad = form("Mobil", ProcessState::Waiting);
        bad.plate = "   ".to_string();
        let err = service.register_vehicle(owner.id, bad).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_register_unknown_owner() {
        let (service, _, _) = service_with_users().await;
        let err = service
            .register_vehicle(99, form("Mobil", ProcessState::Waiting))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_register_directly_as_finished() {
        let (service, owner, _) = service_with_users().await;
        let vehicle = service
            .register_vehicle(owner.id, form("Motor", ProcessState::Finished))
            .await
            .unwrap();
        assert_eq!(vehicle.finish_time, Some(at(10, 0)));
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_package() {
        let (service, owner, staff) = service_with_users().await;
        let vehicle = service
            .register_vehicle(owner.id, form("Mobil", ProcessState::Waiting))
            .await
            .unwrap();
        let err = service
            .update_vehicle(&staff, &vehicle.id, form("Truk", ProcessState::Washing))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownPackage(_)));

        // Nada cambió
        let stored = service.get_vehicle(&vehicle.id).await.unwrap();
        assert_eq!(stored.process, ProcessState::Waiting);
    }

    #[tokio::test]
    async fn test_change_state_of_missing_vehicle() {
        let (service, _, staff) = service_with_users().await;
        let err = service
            .change_process_state(&staff, "alice-7", ProcessState::Washing)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_edit_or_move() {
        let (service, owner, _) = service_with_users().await;
        let vehicle = service
            .register_vehicle(owner.id, form("Mobil", ProcessState::Waiting))
            .await
            .unwrap();

        let edit = service
            .update_vehicle(&owner, &vehicle.id, form("Mobil", ProcessState::Washing))
            .await
            .unwrap_err();
        assert!(matches!(edit, AppError::Forbidden(_)));

        let moved = service
            .change_process_state(&owner, &vehicle.id, ProcessState::Finished)
            .await
            .unwrap_err();
        assert_eq!(moved.code(), "FORBIDDEN");

        let stored = service.get_vehicle(&vehicle.id).await.unwrap();
        assert_eq!(stored.process, ProcessState::Waiting);
        assert_eq!(stored.finish_time, None);
    }

    #[tokio::test]
    async fn test_admin_edits_and_moves() {
        let (service, owner, staff) = service_with_users().await;
        let vehicle = service
            .register_vehicle(owner.id, form("Mobil", ProcessState::Waiting))
            .await
            .unwrap();

        let washing = service
            .update_vehicle(&staff, &vehicle.id, form("Mobil", ProcessState::Washing))
            .await
            .unwrap();
        assert_eq!(washing.process, ProcessState::Washing);

        let done = service
            .change_process_state(&staff, &vehicle.id, ProcessState::Finished)
            .await
            .unwrap();
        assert_eq!(done.finish_time, Some(at(10, 0)));
    }

    #[tokio::test]
    async fn test_only_owner_deletes() {
        let (service, owner, staff) = service_with_users().await;
        let vehicle = service
            .register_vehicle(owner.id, form("Mobil", ProcessState::Waiting))
            .await
            .unwrap();

        let err = service.delete_vehicle(&staff, &vehicle.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(service.get_vehicle(&vehicle.id).await.is_ok());

        service.delete_vehicle(&owner, &vehicle.id).await.unwrap();
        assert!(matches!(
            service.delete_vehicle(&owner, &vehicle.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
