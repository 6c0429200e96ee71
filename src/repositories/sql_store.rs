//! Implementación de [`QueueStore`] sobre SQLite

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::{NewUser, ProcessState, User, Vehicle};
use crate::repositories::traits::QueueStore;
use crate::repositories::user_repository::UserRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::queue_engine::Sequences;
use crate::utils::errors::AppResult;

pub struct SqlStore {
    users: UserRepository,
    vehicles: VehicleRepository,
}

impl SqlStore {
    /// El pool debe tener el schema ya migrado
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool),
        }
    }
}

#[async_trait]
impl QueueStore for SqlStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        self.users.create(user).await
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.users.find_by_username(username).await
    }

    async fn set_user_admin(&self, username: &str, admin: bool) -> AppResult<Option<User>> {
        self.users.set_admin(username, admin).await
    }

    async fn count_vehicles_for_owner(&self, owner_id: i64) -> AppResult<i64> {
        self.vehicles.count_for_owner(owner_id).await
    }

    async fn count_vehicles_for_date(&self, date: NaiveDate) -> AppResult<i64> {
        self.vehicles.count_for_date(date).await
    }

    async fn allocate_sequences(&self, owner_id: i64, date: NaiveDate) -> AppResult<Sequences> {
        self.vehicles.allocate_sequences(owner_id, date).await
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        self.vehicles.create(vehicle).await
    }

    async fn find_vehicle_by_id(&self, id: &str) -> AppResult<Option<Vehicle>> {
        self.vehicles.find_by_id(id).await
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> AppResult<()> {
        self.vehicles.update(vehicle).await
    }

    async fn delete_vehicle(&self, id: &str) -> AppResult<bool> {
        self.vehicles.delete(id).await
    }

    async fn find_vehicles_by_state(
        &self,
        state: ProcessState,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<Vehicle>> {
        self.vehicles.find_by_process(state, date).await
    }

    async fn find_vehicles_by_owner_username(&self, username: &str) -> AppResult<Vec<Vehicle>> {
        self.vehicles.find_by_username(username).await
    }
}
