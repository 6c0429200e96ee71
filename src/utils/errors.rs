//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas serializables para la capa de presentación.

use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la capa de presentación
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub code: String,
}

impl AppError {
    /// Código estable del error, pensado para que la capa de presentación
    /// decida cómo mostrarlo
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UnknownPackage(_) => "UNKNOWN_PACKAGE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Hash(_) => "HASH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convierte el error en una respuesta serializable
    pub fn to_response(&self) -> ErrorResponse {
        let (error, message, details) = match self {
            AppError::Database(e) => (
                "Database Error",
                "An error occurred while accessing the database".to_string(),
                Some(json!({ "sql_error": e.to_string() })),
            ),
            AppError::Validation(e) => (
                "Validation Error",
                "The provided data is invalid".to_string(),
                Some(json!(e)),
            ),
            AppError::NotFound(msg) => ("Not Found", msg.clone(), None),
            AppError::UnknownPackage(package) => (
                "Unknown Package",
                format!("No service duration configured for package '{}'", package),
                Some(json!({ "package": package })),
            ),
            AppError::Conflict(msg) => ("Conflict", msg.clone(), None),
            AppError::Unauthorized(msg) => ("Unauthorized", msg.clone(), None),
            AppError::Forbidden(msg) => ("Forbidden", msg.clone(), None),
            AppError::BadRequest(msg) => ("Bad Request", msg.clone(), None),
            AppError::Config(msg) => ("Configuration Error", msg.clone(), None),
            AppError::Hash(msg) => (
                "Hash Error",
                "An error occurred while processing credentials".to_string(),
                Some(json!({ "hash_error": msg })),
            ),
            AppError::Internal(msg) => (
                "Internal Server Error",
                "An unexpected error occurred".to_string(),
                Some(json!({ "internal_error": msg })),
            ),
        };

        ErrorResponse {
            error: error.to_string(),
            message,
            details,
            code: self.code().to_string(),
        }
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

/// Traduce violaciones de unicidad de SQLite a `Conflict`; el resto queda
/// como error de base de datos
pub fn map_unique_violation(e: sqlx::Error, resource: &str, field: &str, value: &str) -> AppError {
    let is_unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        conflict_error(resource, field, value)
    } else {
        AppError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::UnknownPackage("Truk".into()).code(), "UNKNOWN_PACKAGE");
        assert_eq!(not_found_error("Vehicle", "alice-9").code(), "NOT_FOUND");
        assert_eq!(conflict_error("User", "username", "bob").code(), "CONFLICT");
        assert_eq!(forbidden_error("edit vehicle", "admin only").code(), "FORBIDDEN");
    }

    #[test]
    fn test_error_response_shape() {
        let response = AppError::UnknownPackage("Truk".into()).to_response();
        assert_eq!(response.code, "UNKNOWN_PACKAGE");
        assert!(response.message.contains("Truk"));

        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["details"]["package"], "Truk");
    }

    #[test]
    fn test_validation_error_helper() {
        let err = validation_error("plate", "La placa es requerida");
        match err {
            AppError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("plate"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found_error("Vehicle", "alice-3");
        assert_eq!(err.to_string(), "Not found: Vehicle with id 'alice-3' not found");
    }
}
