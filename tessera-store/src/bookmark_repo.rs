use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use tessera_core::bookmark::{Bookmark, NewBookmark};
use tessera_core::error::{CoreError, CoreResult};
use tessera_core::repository::BookmarkRepository;

pub struct PgBookmarkRepository {
    pool: PgPool,
}

impl PgBookmarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BookmarkRow> for Bookmark {
    fn from(row: BookmarkRow) -> Self {
        Bookmark {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn create(&self, bookmark: NewBookmark) -> CoreResult<Bookmark> {
        let created = Bookmark {
            id: Uuid::new_v4(),
            user_id: bookmark.user_id,
            event_id: bookmark.event_id,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO bookmarks (id, user_id, event_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(created.id)
        .bind(created.user_id)
        .bind(created.event_id)
        .bind(created.created_at)
        .execute(&self.pool)
        .await
        .map_err(CoreError::store)?;

        Ok(created)
    }

    async fn find_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<Option<Bookmark>> {
        let row = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT id, user_id, event_id, created_at
            FROM bookmarks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(row.map(Bookmark::from))
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Bookmark>> {
        let rows = sqlx::query_as::<_, BookmarkRow>(
            r#"
            SELECT id, user_id, event_id, created_at
            FROM bookmarks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CoreError::store)?;
        Ok(rows.into_iter().map(Bookmark::from).collect())
    }

    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(CoreError::store)?;
        Ok(result.rows_affected() > 0)
    }
}
