//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos de usuarios y vehículos
//! de la cola de lavado.

pub mod user;
pub mod vehicle;

pub use user::*;
pub use vehicle::*;
