//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y el catálogo de paquetes de lavado.

pub mod database;
pub mod environment;
pub mod packages;

pub use environment::*;
pub use packages::PackageCatalog;
