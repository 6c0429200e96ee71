//! Catálogo de paquetes de lavado
//!
//! Tabla de duración del servicio (en minutos) por paquete. Es configuración
//! del despliegue: se puede reemplazar con `PACKAGE_DURATIONS` (objeto JSON)
//! o `PACKAGE_DURATIONS_FILE` (ruta a un archivo JSON).

use std::collections::BTreeMap;
use std::env;
use std::fs;

use serde::Serialize;

use crate::utils::errors::{AppError, AppResult};

/// Duraciones por defecto
const DEFAULT_DURATIONS: [(&str, u32); 5] = [
    ("Motor", 25),
    ("Mobil", 40),
    ("Mobil Besar", 50),
    ("Motor Besar", 30),
    ("Cuci Luar Mobil", 40),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageCatalog {
    durations: BTreeMap<String, u32>,
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self {
            durations: DEFAULT_DURATIONS
                .iter()
                .map(|(key, minutes)| (key.to_string(), *minutes))
                .collect(),
        }
    }
}

impl PackageCatalog {
    /// Construir un catálogo validando que ninguna duración sea cero
    pub fn new(durations: BTreeMap<String, u32>) -> AppResult<Self> {
        if durations.is_empty() {
            return Err(AppError::Config("package catalog is empty".to_string()));
        }
        if let Some((key, _)) = durations.iter().find(|(_, minutes)| **minutes == 0) {
            return Err(AppError::Config(format!(
                "package '{}' must have a positive duration",
                key
            )));
        }
        if let Some(key) = durations.keys().find(|key| key.trim().is_empty()) {
            return Err(AppError::Config(format!("invalid package key '{}'", key)));
        }
        Ok(Self { durations })
    }

    /// Parsear un objeto JSON `{"Motor": 25, ...}`
    ///
    /// Valores negativos o decimales no caben en `u32` y se rechazan aquí.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let durations: BTreeMap<String, u32> = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("invalid package durations: {}", e)))?;
        Self::new(durations)
    }

    /// Cargar desde el entorno; sin variables se usa la tabla por defecto
    pub fn from_env() -> AppResult<Self> {
        if let Ok(raw) = env::var("PACKAGE_DURATIONS") {
            return Self::from_json(&raw);
        }
        if let Ok(path) = env::var("PACKAGE_DURATIONS_FILE") {
            let raw = fs::read_to_string(&path).map_err(|e| {
                AppError::Config(format!("cannot read PACKAGE_DURATIONS_FILE '{}': {}", path, e))
            })?;
            return Self::from_json(&raw);
        }
        Ok(Self::default())
    }

    /// Duración en minutos del paquete
    pub fn duration(&self, package: &str) -> AppResult<u32> {
        self.durations
            .get(package)
            .copied()
            .ok_or_else(|| AppError::UnknownPackage(package.to_string()))
    }

    pub fn packages(&self) -> impl Iterator<Item = (&str, u32)> {
        self.durations.iter().map(|(key, minutes)| (key.as_str(), *minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = PackageCatalog::default();
        assert_eq!(catalog.duration("Motor").unwrap(), 25);
        assert_eq!(catalog.duration("Mobil").unwrap(), 40);
        assert_eq!(catalog.duration("Mobil Besar").unwrap(), 50);
        assert_eq!(catalog.duration("Motor Besar").unwrap(), 30);
        assert_eq!(catalog.duration("Cuci Luar Mobil").unwrap(), 40);
        assert_eq!(catalog.packages().count(), 5);
    }

    #[test]
    fn test_unknown_package() {
        let catalog = PackageCatalog::default();
        match catalog.duration("Truk") {
            Err(AppError::UnknownPackage(key)) => assert_eq!(key, "Truk"),
            other => panic!("unexpected result: {:?}", other),
        }
        // Las claves distinguen mayúsculas
        assert!(catalog.duration("mobil").is_err());
    }

    #[test]
    fn test_from_json_override() {
        let catalog = PackageCatalog::from_json(r#"{"Truk": 90, "Motor": 20}"#).unwrap();
        assert_eq!(catalog.duration("Truk").unwrap(), 90);
        assert_eq!(catalog.duration("Motor").unwrap(), 20);
        assert!(catalog.duration("Mobil").is_err());
    }

    // Un solo test toca estas variables para no pisarse con otros en paralelo
    #[test]
    fn test_from_env_sources() {
        env::remove_var("PACKAGE_DURATIONS");
        env::remove_var("PACKAGE_DURATIONS_FILE");
        assert_eq!(PackageCatalog::from_env().unwrap(), PackageCatalog::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.json");
        fs::write(&path, r#"{"Motor": 20, "Truk": 90}"#).unwrap();
        env::set_var("PACKAGE_DURATIONS_FILE", &path);
        let catalog = PackageCatalog::from_env().unwrap();
        assert_eq!(catalog.duration("Motor").unwrap(), 20);
        assert_eq!(catalog.duration("Truk").unwrap(), 90);
        assert!(catalog.duration("Mobil").is_err());

        // La variable inline tiene prioridad sobre el archivo
        env::set_var("PACKAGE_DURATIONS", r#"{"Mobil": 45}"#);
        let inline = PackageCatalog::from_env().unwrap();
        assert_eq!(inline.duration("Mobil").unwrap(), 45);
        assert_eq!(inline.packages().count(), 1);
        env::remove_var("PACKAGE_DURATIONS");

        env::set_var("PACKAGE_DURATIONS_FILE", dir.path().join("missing.json"));
        assert!(matches!(PackageCatalog::from_env(), Err(AppError::Config(_))));

        fs::write(&path, r#"{"Motor": 0}"#).unwrap();
        env::set_var("PACKAGE_DURATIONS_FILE", &path);
        assert!(matches!(PackageCatalog::from_env(), Err(AppError::Config(_))));

        env::remove_var("PACKAGE_DURATIONS_FILE");
    }

    #[test]
    fn test_from_json_rejects_invalid_durations() {
        assert!(PackageCatalog::from_json(r#"{"Motor": -5}"#).is_err());
        assert!(PackageCatalog::from_json(r#"{"Motor": 0}"#).is_err());
        assert!(PackageCatalog::from_json(r#"{"Motor": 12.5}"#).is_err());
        assert!(PackageCatalog::from_json(r#"{}"#).is_err());
        assert!(PackageCatalog::from_json("not json").is_err());
    }
}
