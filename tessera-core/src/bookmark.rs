use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::repository::{BookmarkRepository, EventRepository, UserRepository};

/// A user's saved pointer at an event. One per (user, event) in intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub user_id: Uuid,
    pub event_id: Uuid,
}

/// Bookmark CRUD, always scoped to the authenticated user's email so one
/// user can never read or drop another's bookmarks.
pub struct BookmarkService {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    bookmarks: Arc<dyn BookmarkRepository>,
}

impl BookmarkService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        bookmarks: Arc<dyn BookmarkRepository>,
    ) -> Self {
        Self {
            users,
            events,
            bookmarks,
        }
    }

    pub async fn create(&self, user_email: &str, event_id: Uuid) -> CoreResult<Bookmark> {
        let user = self.resolve_user(user_email).await?;
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(CoreError::NotFound("event"))?;

        self.bookmarks
            .create(NewBookmark {
                user_id: user,
                event_id: event.id,
            })
            .await
    }

    pub async fn list(&self, user_email: &str) -> CoreResult<Vec<Bookmark>> {
        let user = self.resolve_user(user_email).await?;
        self.bookmarks.list_by_user(user).await
    }

    pub async fn get(&self, user_email: &str, bookmark_id: Uuid) -> CoreResult<Bookmark> {
        let user = self.resolve_user(user_email).await?;
        self.bookmarks
            .find_by_id_and_user(bookmark_id, user)
            .await?
            .ok_or(CoreError::NotFound("bookmark"))
    }

    pub async fn delete(&self, user_email: &str, bookmark_id: Uuid) -> CoreResult<()> {
        let user = self.resolve_user(user_email).await?;
        if self.bookmarks.delete_by_id_and_user(bookmark_id, user).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound("bookmark"))
        }
    }

    async fn resolve_user(&self, email: &str) -> CoreResult<Uuid> {
        self.users
            .find_by_email(email)
            .await?
            .map(|u| u.id)
            .ok_or(CoreError::NotFound("user"))
    }
}
