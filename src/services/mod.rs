//! Services module
//!
//! Este módulo contiene la lógica de negocio de la cola de lavado.
//! `queue_engine` es cálculo puro; los servicios lo combinan con el
//! almacenamiento.

pub mod authorization;
pub mod queue_engine;
pub mod user_service;
pub mod vehicle_service;

pub use queue_engine::{Clock, FinishTimePolicy, FixedClock, SystemClock};
pub use user_service::UserService;
pub use vehicle_service::{BoardScope, VehicleService};
