//! Implementación en memoria de [`QueueStore`]
//!
//! Todo el estado vive detrás de un único mutex, así que reservar números e
//! insertar nunca se intercalan entre tareas. Se pierde al reiniciar.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{NewUser, ProcessState, User, Vehicle};
use crate::repositories::traits::QueueStore;
use crate::services::queue_engine::{
    next_queue_position, next_sequence, owner_sequence_of, Sequences,
};
use crate::utils::errors::{conflict_error, not_found_error, AppResult};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    // Orden de inserción
    vehicles: Vec<Vehicle>,
    owner_counters: HashMap<i64, i64>,
    day_counters: HashMap<NaiveDate, i64>,
    next_user_id: i64,
}

impl MemoryState {
    fn owner_username(&self, user_id: i64) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.as_str())
    }

    fn last_owner_sequence(&self, owner_id: i64) -> i64 {
        let Some(username) = self.owner_username(owner_id) else {
            return 0;
        };
        self.vehicles
            .iter()
            .filter(|v| v.user_id == owner_id)
            .filter_map(|v| owner_sequence_of(&v.id, username))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.username == user.username) {
            return Err(conflict_error("User", "username", &user.username));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.next_user_id,
            username: user.username,
            password_hash: user.password_hash,
            admin: user.admin,
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());

        Ok(created)
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn set_user_admin(&self, username: &str, admin: bool) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        Ok(state
            .users
            .iter_mut()
            .find(|u| u.username == username)
            .map(|user| {
                user.admin = admin;
                user.updated_at = Utc::now();
                user.clone()
            }))
    }

    async fn count_vehicles_for_owner(&self, owner_id: i64) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.vehicles.iter().filter(|v| v.user_id == owner_id).count() as i64)
    }

    async fn count_vehicles_for_date(&self, date: NaiveDate) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.vehicles.iter().filter(|v| v.date == date).count() as i64)
    }

    async fn allocate_sequences(&self, owner_id: i64, date: NaiveDate) -> AppResult<Sequences> {
        let mut state = self.state.lock().await;

        // Contador nuevo: arranca desde el mayor número en uso
        let last_owned = state.last_owner_sequence(owner_id);
        let last_queued = state
            .vehicles
            .iter()
            .filter(|v| v.date == date)
            .map(|v| v.queue)
            .max()
            .unwrap_or(0);

        let owner_counter = state.owner_counters.entry(owner_id).or_insert(last_owned);
        *owner_counter = next_sequence(*owner_counter);
        let owner_sequence = *owner_counter;

        let day_counter = state.day_counters.entry(date).or_insert(last_queued);
        *day_counter = next_queue_position(*day_counter);
        let queue_position = *day_counter;

        debug!(owner_id, %date, owner_sequence, queue_position, "Sequences allocated");
        Ok(Sequences {
            owner_sequence,
            queue_position,
        })
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        let mut state = self.state.lock().await;

        if state.vehicles.iter().any(|v| v.id == vehicle.id) {
            return Err(conflict_error("Vehicle", "id", &vehicle.id));
        }
        let owner = state
            .owner_username(vehicle.user_id)
            .ok_or_else(|| not_found_error("User", &vehicle.user_id.to_string()))?
            .to_string();

        let mut stored = vehicle.clone();
        stored.owner_username = owner;
        state.vehicles.push(stored);

        Ok(())
    }

    async fn find_vehicle_by_id(&self, id: &str) -> AppResult<Option<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state.vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let stored = state
            .vehicles
            .iter_mut()
            .find(|v| v.id == vehicle.id)
            .ok_or_else(|| not_found_error("Vehicle", &vehicle.id))?;

        stored.name = vehicle.name.clone();
        stored.package = vehicle.package.clone();
        stored.plate = vehicle.plate.clone();
        stored.contact = vehicle.contact.clone();
        stored.process = vehicle.process;
        stored.finish_time = vehicle.finish_time;

        Ok(())
    }

    async fn delete_vehicle(&self, id: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.vehicles.len();
        state.vehicles.retain(|v| v.id != id);
        Ok(state.vehicles.len() < before)
    }

    async fn find_vehicles_by_state(
        &self,
        process: ProcessState,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state
            .vehicles
            .iter()
            .filter(|v| v.process == process)
            .filter(|v| date.map_or(true, |d| v.date == d))
            .cloned()
            .collect())
    }

    async fn find_vehicles_by_owner_username(&self, username: &str) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state
            .vehicles
            .iter()
            .filter(|v| v.owner_username == username)
            .cloned()
            .collect())
    }
}
