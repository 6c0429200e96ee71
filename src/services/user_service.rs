//! Servicio de usuarios
//!
//! Registro con nombre de usuario único y contraseña hasheada con bcrypt,
//! y verificación de credenciales. Las sesiones quedan fuera de este crate.

use std::sync::Arc;

use bcrypt::{hash, verify};
use tracing::{info, warn};
use validator::Validate;

use crate::models::{CreateUserRequest, NewUser, User};
use crate::repositories::QueueStore;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct UserService {
    store: Arc<dyn QueueStore>,
    password_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn QueueStore>, password_cost: u32) -> Self {
        Self {
            store,
            password_cost,
        }
    }

    /// Registrar un usuario nuevo
    pub async fn register_user(&self, request: CreateUserRequest) -> AppResult<User> {
        request.validate()?;

        if self
            .store
            .find_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(conflict_error("User", "username", &request.username));
        }

        let password_hash = hash(&request.password, self.password_cost)
            .map_err(|e| AppError::Hash(e.to_string()))?;

        // La restricción UNIQUE del store cubre la carrera entre la consulta y la inserción
        let user = self
            .store
            .insert_user(NewUser {
                username: request.username,
                password_hash,
                admin: false,
            })
            .await?;

        info!("👤 Usuario {} registrado", user.username);
        Ok(user)
    }

    /// Dar permisos de administrador a un usuario existente
    ///
    /// Es una acción del operador (`ADMIN_USERNAMES` al arrancar); el
    /// registro nunca crea administradores.
    pub async fn grant_admin(&self, username: &str) -> AppResult<User> {
        let user = self
            .store
            .set_user_admin(username, true)
            .await?
            .ok_or_else(|| not_found_error("User", username))?;

        info!("🔑 {} ahora es administrador", user.username);
        Ok(user)
    }

    /// Verificar usuario y contraseña; mismo error si falta el usuario o la clave no coincide
    pub async fn verify_credentials(&self, username: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                warn!("Login fallido para usuario inexistente: {}", username);
                return Err(invalid());
            }
        };

        let matches = verify(password, &user.password_hash)
            .map_err(|e| AppError::Hash(e.to_string()))?;
        if !matches {
            warn!("Login fallido para {}", username);
            return Err(invalid());
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("User", &id.to_string()))
    }
}
