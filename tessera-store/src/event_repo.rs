use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use tessera_core::error::{CoreError, CoreResult};
use tessera_core::event::Event;
use tessera_core::repository::EventRepository;

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) starts_at: chrono::DateTime<chrono::Utc>,
    pub(crate) ends_at: chrono::DateTime<chrono::Utc>,
    pub(crate) max_attendees: i32,
    pub(crate) available_attendees: i32,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            max_attendees: row.max_attendees,
            available_attendees: row.available_attendees,
        }
    }
}

/// Locked read: acquires an exclusive row lock held until the enclosing
/// transaction commits or rolls back. Only the reservation transaction uses
/// this; every other read path goes through the plain `find_by_id`.
pub(crate) async fn fetch_locked(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> CoreResult<Option<EventRow>> {
    sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, starts_at, ends_at, max_attendees, available_attendees
        FROM events
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(CoreError::store)
}

/// Write the decremented counter inside the same transaction that holds the
/// row lock, so the change is visible before commit and rolls back with it.
pub(crate) async fn save_available(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    available_attendees: i32,
) -> CoreResult<()> {
    sqlx::query("UPDATE events SET available_attendees = $2 WHERE id = $1")
        .bind(id)
        .bind(available_attendees)
        .execute(&mut **tx)
        .await
        .map_err(CoreError::store)?;
    Ok(())
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, event: &Event) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, starts_at, ends_at, max_attendees, available_attendees)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.max_attendees)
        .bind(event.available_attendees)
        .execute(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, starts_at, ends_at, max_attendees, available_attendees
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(row.map(Event::from))
    }

    async fn list(&self) -> CoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, starts_at, ends_at, max_attendees, available_attendees
            FROM events
            ORDER BY starts_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(CoreError::store)?;
        Ok(result.rows_affected() > 0)
    }
}
