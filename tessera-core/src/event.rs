use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::repository::EventRepository;

/// A schedulable happening with finite attendee capacity.
///
/// `max_attendees` is the immutable ceiling; `available_attendees` only ever
/// moves down, one seat per confirmed reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_attendees: i32,
    pub available_attendees: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub max_attendees: i32,
}

/// Catalog surface: admin create/delete plus lock-free browse reads.
pub struct EventService {
    events: Arc<dyn EventRepository>,
}

impl EventService {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self { events }
    }

    pub async fn create(&self, new_event: NewEvent) -> CoreResult<Event> {
        if new_event.max_attendees <= 0 {
            return Err(CoreError::Validation(
                "max_attendees must be positive".to_string(),
            ));
        }
        if new_event.ends_at <= new_event.starts_at {
            return Err(CoreError::Validation(
                "event must end after it starts".to_string(),
            ));
        }

        // New events go on sale with every seat open
        let event = Event {
            id: Uuid::new_v4(),
            title: new_event.title,
            starts_at: new_event.starts_at,
            ends_at: new_event.ends_at,
            max_attendees: new_event.max_attendees,
            available_attendees: new_event.max_attendees,
        };

        self.events.insert(&event).await?;
        tracing::info!("event {} created with {} seats", event.id, event.max_attendees);
        Ok(event)
    }

    pub async fn get(&self, id: Uuid) -> CoreResult<Event> {
        self.events
            .find_by_id(id)
            .await?
            .ok_or(CoreError::NotFound("event"))
    }

    pub async fn list(&self) -> CoreResult<Vec<Event>> {
        self.events.list().await
    }

    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        if self.events.delete(id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound("event"))
        }
    }
}
