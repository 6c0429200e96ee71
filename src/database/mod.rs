//! Módulo de base de datos
//!
//! Maneja la conexión y la migración del schema en SQLite

pub mod connection;

pub use connection::DatabaseConnection;
