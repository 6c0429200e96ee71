//! Cola de lavado de vehículos
//!
//! Registro de vehículos con número de cola diario, hora estimada de salida
//! según el paquete y seguimiento del estado (espera, lavado, terminado).

pub mod config;
pub mod database;
pub mod dto;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
