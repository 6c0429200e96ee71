//! Motor de cola y tiempos
//!
//! Cálculo puro, sin I/O: identificadores por dueño, posición en la cola
//! del día, hora estimada de salida y transiciones de estado del proceso.
//! La hora actual se inyecta con un [`Clock`].

use std::str::FromStr;
use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::models::{ProcessState, Vehicle};
use crate::utils::errors::{AppError, AppResult};

/// Fuente de la hora de pared local
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reloj del sistema (hora local del proceso)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Reloj fijo y ajustable, para tests y simulaciones
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { now: Mutex::new(at) }
    }

    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Números asignados a un vehículo nuevo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequences {
    /// Sufijo del identificador `{username}-{n}`
    pub owner_sequence: i64,
    /// Posición 1-based en la cola del día
    pub queue_position: i64,
}

/// Siguiente secuencia del dueño a partir de la última entregada
pub fn next_sequence(last_owner_sequence: i64) -> i64 {
    last_owner_sequence + 1
}

/// Siguiente posición en la cola a partir de la última del día
pub fn next_queue_position(last_queue_position: i64) -> i64 {
    last_queue_position + 1
}

pub fn vehicle_id(username: &str, sequence: i64) -> String {
    format!("{}-{}", username, sequence)
}

/// Inverso de [`vehicle_id`]: la secuencia de `id` si pertenece a `username`
pub fn owner_sequence_of(id: &str, username: &str) -> Option<i64> {
    id.strip_prefix(username)?
        .strip_prefix('-')?
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
}

/// Recortar a precisión de minuto
pub fn truncate_to_minute(time: NaiveDateTime) -> NaiveDateTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Hora estimada de salida: entrada (al minuto) + duración del paquete
pub fn estimated_finish(enter_time: NaiveDateTime, duration_minutes: u32) -> AppResult<NaiveDateTime> {
    truncate_to_minute(enter_time)
        .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "estimated finish overflows: {} + {} min",
                enter_time, duration_minutes
            ))
        })
}

/// Formato de reloj de 12 horas, p. ej. `10:40 AM` o `3:04 PM`
pub fn format_clock(time: NaiveDateTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Qué hacer con la hora de salida cuando un vehículo vuelve a Finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishTimePolicy {
    /// Se registra una sola vez, en la primera llegada a Finished
    #[default]
    KeepFirst,
    /// Cada entrada a Finished vuelve a registrar la hora
    RecordLatest,
}

impl FromStr for FinishTimePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_first" | "first" => Ok(FinishTimePolicy::KeepFirst),
            "record_latest" | "latest" => Ok(FinishTimePolicy::RecordLatest),
            other => Err(AppError::Config(format!(
                "FINISH_TIME_POLICY must be keep_first or record_latest, got '{}'",
                other
            ))),
        }
    }
}

/// Resultado de una transición de estado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: ProcessState,
    /// Hora de salida a registrar, si la transición la produce
    pub finish_stamp: Option<NaiveDateTime>,
}

impl Transition {
    /// Aplicar el estado y, si corresponde, la hora de salida.
    /// Nunca borra una hora ya registrada.
    pub fn apply(self, vehicle: &mut Vehicle) {
        vehicle.process = self.state;
        if let Some(stamp) = self.finish_stamp {
            vehicle.finish_time = Some(stamp);
        }
    }
}

/// Transición total sobre cualquier par (actual, pedido)
///
/// Solo la entrada a Finished desde otro estado produce hora de salida;
/// si ya había una registrada decide `policy`.
pub fn transition(
    current: ProcessState,
    requested: ProcessState,
    recorded_finish: Option<NaiveDateTime>,
    now: NaiveDateTime,
    policy: FinishTimePolicy,
) -> Transition {
    let entering_finished = requested.is_terminal() && !current.is_terminal();

    let finish_stamp = match (entering_finished, recorded_finish, policy) {
        (false, _, _) => None,
        (true, None, _) => Some(truncate_to_minute(now)),
        (true, Some(_), FinishTimePolicy::RecordLatest) => Some(truncate_to_minute(now)),
        (true, Some(_), FinishTimePolicy::KeepFirst) => None,
    };

    Transition {
        state: requested,
        finish_stamp,
    }
}

/// Hora de salida de un vehículo registrado directamente como Finished
pub fn initial_finish_time(initial: ProcessState, now: NaiveDateTime) -> Option<NaiveDateTime> {
    initial.is_terminal().then(|| truncate_to_minute(now))
}
