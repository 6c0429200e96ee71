//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, el estado del proceso de lavado
//! y los formularios de registro/edición.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::errors::{AppError, AppResult};

/// Estado del proceso de lavado
///
/// El orden de las variantes es el orden del flujo de trabajo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Waiting,
    Washing,
    Finished,
}

impl ProcessState {
    /// Todos los estados en el orden del flujo
    pub const ALL: [ProcessState; 3] = [
        ProcessState::Waiting,
        ProcessState::Washing,
        ProcessState::Finished,
    ];

    /// Clave canónica que se guarda en la base de datos
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Waiting => "waiting",
            ProcessState::Washing => "washing",
            ProcessState::Finished => "finished",
        }
    }

    /// Finished es terminal solo por convención; se puede salir de él
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessState::Finished)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting" => Ok(ProcessState::Waiting),
            "washing" => Ok(ProcessState::Washing),
            "finished" => Ok(ProcessState::Finished),
            other => Err(AppError::BadRequest(format!("Unknown process state '{}'", other))),
        }
    }
}

/// Etiquetas de los estados según el despliegue (p. ej. Menunggu/Dicuci/Selesai)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLabels {
    pub waiting: String,
    pub washing: String,
    pub finished: String,
}

impl Default for ProcessLabels {
    fn default() -> Self {
        Self {
            waiting: "Waiting".to_string(),
            washing: "Washing".to_string(),
            finished: "Finished".to_string(),
        }
    }
}

impl ProcessLabels {
    /// Parsear una lista separada por comas en orden Waiting,Washing,Finished
    pub fn from_csv(raw: &str) -> AppResult<Self> {
        let labels: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        match labels.as_slice() {
            [waiting, washing, finished]
                if !waiting.is_empty() && !washing.is_empty() && !finished.is_empty() =>
            {
                let parsed = Self {
                    waiting: waiting.clone(),
                    washing: washing.clone(),
                    finished: finished.clone(),
                };
                let distinct = ProcessState::ALL
                    .iter()
                    .map(|s| parsed.label(*s).to_lowercase())
                    .collect::<std::collections::HashSet<_>>()
                    .len();
                if distinct != ProcessState::ALL.len() {
                    return Err(AppError::Config(format!(
                        "PROCESS_LABELS must be distinct, got '{}'",
                        raw
                    )));
                }
                Ok(parsed)
            }
            _ => Err(AppError::Config(format!(
                "PROCESS_LABELS needs exactly three non-empty labels, got '{}'",
                raw
            ))),
        }
    }

    pub fn label(&self, state: ProcessState) -> &str {
        match state {
            ProcessState::Waiting => &self.waiting,
            ProcessState::Washing => &self.washing,
            ProcessState::Finished => &self.finished,
        }
    }

    /// Acepta la etiqueta del despliegue o la clave canónica, sin distinguir mayúsculas
    pub fn parse(&self, raw: &str) -> AppResult<ProcessState> {
        let wanted = raw.trim();
        ProcessState::ALL
            .iter()
            .copied()
            .find(|state| self.label(*state).eq_ignore_ascii_case(wanted))
            .map(Ok)
            .unwrap_or_else(|| ProcessState::from_str(wanted))
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// `{username}-{secuencia}`, inmutable
    pub id: String,
    pub user_id: i64,
    pub owner_username: String,
    /// Posición en la cola del día, empezando en 1
    pub queue: i64,
    pub name: String,
    pub package: String,
    pub plate: String,
    pub contact: String,
    pub process: ProcessState,
    pub date: NaiveDate,
    pub enter_time: NaiveDateTime,
    pub estimated_time: NaiveDateTime,
    pub finish_time: Option<NaiveDateTime>,
}

/// Campos editables de un vehículo, usados tanto al registrar como al editar
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 50))]
    pub package: String,

    #[validate(length(min = 1, max = 20))]
    pub plate: String,

    #[validate(length(max = 50))]
    #[serde(default)]
    pub contact: String,

    /// Sin valor por defecto: quien registra debe indicar el estado inicial
    pub process: ProcessState,
}

/// Grupo de vehículos de un mismo estado, para el tablero de la cola
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessGroup {
    pub process: ProcessState,
    pub vehicles: Vec<Vehicle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_state_order_and_keys() {
        let keys: Vec<&str> = ProcessState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(keys, vec!["waiting", "washing", "finished"]);
        assert!(ProcessState::Finished.is_terminal());
        assert!(!ProcessState::Washing.is_terminal());
    }

    #[test]
    fn test_process_state_from_str() {
        assert_eq!("Washing".parse::<ProcessState>().unwrap(), ProcessState::Washing);
        assert!("selesai".parse::<ProcessState>().is_err());
    }

    #[test]
    fn test_labels_from_csv() {
        let labels = ProcessLabels::from_csv("Menunggu, Dicuci, Selesai").unwrap();
        assert_eq!(labels.label(ProcessState::Finished), "Selesai");
        assert_eq!(labels.parse("selesai").unwrap(), ProcessState::Finished);
        // La clave canónica sigue siendo válida
        assert_eq!(labels.parse("washing").unwrap(), ProcessState::Washing);
        assert!(labels.parse("Antri").is_err());
    }

    #[test]
    fn test_labels_rejects_bad_lists() {
        assert!(ProcessLabels::from_csv("Waiting,Washing").is_err());
        assert!(ProcessLabels::from_csv("Waiting,,Finished").is_err());
        assert!(ProcessLabels::from_csv("Done,Done,Done").is_err());
    }

    #[test]
    fn test_form_validation() {
        let form = VehicleForm {
            name: "Avanza".to_string(),
            package: "Mobil".to_string(),
            plate: String::new(),
            contact: String::new(),
            process: ProcessState::Waiting,
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("plate"));
    }
}
