use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ProcessGroup, ProcessLabels, Vehicle};
use crate::services::queue_engine::format_clock;

// Response de vehículo, con horas en formato de reloj y la etiqueta del estado
#[derive(Debug, Clone, Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub username: String,
    pub queue: i64,
    pub name: String,
    pub package: String,
    pub plate: String,
    pub contact: String,
    pub process: String,
    pub date: String,
    pub enter_time: String,
    pub estimated_time: String,
    /// Vacío mientras el vehículo no haya terminado
    pub finish_time: String,
}

impl VehicleResponse {
    pub fn from_vehicle(vehicle: &Vehicle, labels: &ProcessLabels) -> Self {
        Self {
            id: vehicle.id.clone(),
            username: vehicle.owner_username.clone(),
            queue: vehicle.queue,
            name: vehicle.name.clone(),
            package: vehicle.package.clone(),
            plate: vehicle.plate.clone(),
            contact: vehicle.contact.clone(),
            process: labels.label(vehicle.process).to_string(),
            date: vehicle.date.format("%Y-%m-%d").to_string(),
            enter_time: format_clock(vehicle.enter_time),
            estimated_time: format_clock(vehicle.estimated_time),
            finish_time: vehicle.finish_time.map(format_clock).unwrap_or_default(),
        }
    }
}

// Grupo del tablero
#[derive(Debug, Clone, Serialize)]
pub struct ProcessGroupResponse {
    pub process: String,
    pub vehicles: Vec<VehicleResponse>,
}

impl ProcessGroupResponse {
    pub fn from_group(group: &ProcessGroup, labels: &ProcessLabels) -> Self {
        Self {
            process: labels.label(group.process).to_string(),
            vehicles: group
                .vehicles
                .iter()
                .map(|v| VehicleResponse::from_vehicle(v, labels))
                .collect(),
        }
    }
}

// Tablero completo de la cola
#[derive(Debug, Clone, Serialize)]
pub struct QueueBoardResponse {
    pub date: String,
    pub registered: i64,
    pub groups: Vec<ProcessGroupResponse>,
}

impl QueueBoardResponse {
    pub fn new(date: NaiveDate, registered: i64, groups: &[ProcessGroup], labels: &ProcessLabels) -> Self {
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            registered,
            groups: groups
                .iter()
                .map(|g| ProcessGroupResponse::from_group(g, labels))
                .collect(),
        }
    }
}
