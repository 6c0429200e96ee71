//! Reglas de autorización sobre vehículos
//!
//! Solo un administrador edita un vehículo o mueve su estado; solo el dueño
//! lo borra. Registrar y consultar no requieren permisos.

use crate::models::{User, Vehicle};
use crate::utils::errors::{forbidden_error, AppResult};

pub fn can_edit_vehicle(user: &User) -> bool {
    user.admin
}

pub fn can_change_process(user: &User) -> bool {
    user.admin
}

/// El dueño, y nadie más, puede borrar su vehículo
pub fn can_delete_vehicle(user: &User, vehicle: &Vehicle) -> bool {
    user.id == vehicle.user_id
}

/// Convertir una regla en `Forbidden`
pub fn require(allowed: bool, operation: &str, reason: &str) -> AppResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(forbidden_error(operation, reason))
    }
}
