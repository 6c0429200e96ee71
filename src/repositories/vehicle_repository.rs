use crate::models::{ProcessState, Vehicle};
use crate::services::queue_engine::Sequences;
use crate::utils::errors::{map_unique_violation, not_found_error, AppError};
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqlitePool;
use tracing::debug;

// Fila tal como sale de SQLite; el estado viene como texto
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: String,
    user_id: i64,
    owner_username: String,
    queue: i64,
    name: String,
    package: String,
    plate: String,
    contact: String,
    process: String,
    date: NaiveDate,
    enter_time: NaiveDateTime,
    estimated_time: NaiveDateTime,
    finish_time: Option<NaiveDateTime>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let process: ProcessState = row.process.parse().map_err(|_| {
            AppError::Internal(format!(
                "vehicle '{}' has corrupt process state '{}'",
                row.id, row.process
            ))
        })?;

        Ok(Vehicle {
            id: row.id,
            user_id: row.user_id,
            owner_username: row.owner_username,
            queue: row.queue,
            name: row.name,
            package: row.package,
            plate: row.plate,
            contact: row.contact,
            process,
            date: row.date,
            enter_time: row.enter_time,
            estimated_time: row.estimated_time,
            finish_time: row.finish_time,
        })
    }
}

const SELECT_VEHICLE: &str = r#"
    SELECT v.id, v.user_id, u.username AS owner_username, v.queue, v.name, v.package,
           v.plate, v.contact, v.process, v.date, v.enter_time, v.estimated_time, v.finish_time
    FROM vehicles v
    JOIN users u ON u.id = v.user_id
"#;

fn into_vehicles(rows: Vec<VehicleRow>) -> Result<Vec<Vehicle>, AppError> {
    rows.into_iter().map(Vehicle::try_from).collect()
}

pub struct VehicleRepository {
    pool: SqlitePool,
}

impl VehicleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn count_for_owner(&self, owner_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE user_id = ?")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_for_date(&self, date: NaiveDate) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE date = ?")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Incrementa los contadores del dueño y del día en una sola transacción.
    /// Un contador nuevo arranca después del mayor número en uso: la
    /// secuencia más alta de los ids del dueño y la cola más alta del día.
    pub async fn allocate_sequences(
        &self,
        owner_id: i64,
        date: NaiveDate,
    ) -> Result<Sequences, AppError> {
        let mut tx = self.pool.begin().await?;

        let owner_sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO queue_counters (scope, scope_key, value)
            VALUES ('owner', ?, (
                SELECT COALESCE(MAX(CAST(substr(v.id, length(u.username) + 2) AS INTEGER)), 0)
                FROM vehicles v
                JOIN users u ON u.id = v.user_id
                WHERE v.user_id = ?
                  AND substr(v.id, 1, length(u.username) + 1) = u.username || '-'
            ) + 1)
            ON CONFLICT(scope, scope_key) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(owner_id.to_string())
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let queue_position: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO queue_counters (scope, scope_key, value)
            VALUES ('day', ?, (SELECT COALESCE(MAX(queue), 0) FROM vehicles WHERE date = ?) + 1)
            ON CONFLICT(scope, scope_key) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(date.format("%Y-%m-%d").to_string())
        .bind(date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(owner_id, %date, owner_sequence, queue_position, "Sequences allocated");
        Ok(Sequences {
            owner_sequence,
            queue_position,
        })
    }

    pub async fn create(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, user_id, queue, name, package, plate, contact, process,
                                  date, enter_time, estimated_time, finish_time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&vehicle.id)
        .bind(vehicle.user_id)
        .bind(vehicle.queue)
        .bind(&vehicle.name)
        .bind(&vehicle.package)
        .bind(&vehicle.plate)
        .bind(&vehicle.contact)
        .bind(vehicle.process.as_str())
        .bind(vehicle.date)
        .bind(vehicle.enter_time)
        .bind(vehicle.estimated_time)
        .bind(vehicle.finish_time)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Vehicle", "id", &vehicle.id))?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Vehicle>, AppError> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!("{} WHERE v.id = ?", SELECT_VEHICLE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Vehicle::try_from).transpose()
    }

    pub async fn find_by_process(
        &self,
        process: ProcessState,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "{} WHERE v.process = ? AND (? IS NULL OR v.date = ?) ORDER BY v.date, v.queue",
            SELECT_VEHICLE
        ))
        .bind(process.as_str())
        .bind(date)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        into_vehicles(rows)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "{} WHERE u.username = ? ORDER BY v.date, v.queue",
            SELECT_VEHICLE
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        into_vehicles(rows)
    }

    /// Solo toca los campos editables y la hora de salida; cola, fecha,
    /// entrada y estimado quedan como se crearon
    pub async fn update(&self, vehicle: &Vehicle) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET name = ?, package = ?, plate = ?, contact = ?, process = ?, finish_time = ?
            WHERE id = ?
            "#,
        )
        .bind(&vehicle.name)
        .bind(&vehicle.package)
        .bind(&vehicle.plate)
        .bind(&vehicle.contact)
        .bind(vehicle.process.as_str())
        .bind(vehicle.finish_time)
        .bind(&vehicle.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found_error("Vehicle", &vehicle.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
