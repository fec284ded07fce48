use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tessera_core::error::{CoreError, CoreResult};
use tessera_core::repository::ReservationRepository;
use tessera_core::reservation::{Reservation, ReserveSeat};

use crate::event_repo;

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    booked_at: chrono::DateTime<chrono::Utc>,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            booked_at: row.booked_at,
        }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(&self, cmd: ReserveSeat) -> CoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(CoreError::store)?;

        // 1. Exclusive row lock. Concurrent reserves on this event queue up
        //    here until we commit or roll back, so each transaction sees the
        //    counter its predecessor committed.
        let event = event_repo::fetch_locked(&mut tx, cmd.event_id)
            .await?
            .ok_or(CoreError::NotFound("event"))?;

        // 2. Check under the lock. Bailing out drops the transaction, which
        //    rolls back with nothing written.
        if event.available_attendees <= 0 {
            return Err(CoreError::CapacityExceeded {
                event_id: cmd.event_id,
            });
        }

        // 3. Ledger row and decrement commit together or not at all.
        let reservation = Reservation {
            id: Uuid::new_v4(),
            user_id: cmd.user_id,
            event_id: cmd.event_id,
            booked_at: cmd.booked_at,
        };

        sqlx::query(
            r#"
            INSERT INTO reservations (id, user_id, event_id, booked_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.user_id)
        .bind(reservation.event_id)
        .bind(reservation.booked_at)
        .execute(&mut *tx)
        .await
        .map_err(CoreError::store)?;

        event_repo::save_available(&mut tx, event.id, event.available_attendees - 1).await?;

        tx.commit().await.map_err(CoreError::store)?;

        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, user_id, event_id, booked_at FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(row.map(Reservation::from))
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, user_id, event_id, booked_at
            FROM reservations
            WHERE user_id = $1
            ORDER BY booked_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    async fn update_event(&self, id: Uuid, event_id: Uuid) -> CoreResult<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            UPDATE reservations SET event_id = $2
            WHERE id = $1
            RETURNING id, user_id, event_id, booked_at
            "#,
        )
        .bind(id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(row.map(Reservation::from))
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(CoreError::store)?;
        Ok(result.rows_affected() > 0)
    }
}
