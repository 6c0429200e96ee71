//! Repositorios y almacenamiento
//!
//! `QueueStore` es el contrato que usa el servicio de la cola; `SqlStore`
//! lo implementa sobre SQLite y `MemoryStore` en memoria.

pub mod memory_store;
pub mod sql_store;
pub mod traits;
pub mod user_repository;
pub mod vehicle_repository;

pub use memory_store::MemoryStore;
pub use sql_store::SqlStore;
pub use traits::QueueStore;
