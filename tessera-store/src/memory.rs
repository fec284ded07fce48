use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use tessera_core::bookmark::{Bookmark, NewBookmark};
use tessera_core::error::{CoreError, CoreResult};
use tessera_core::event::Event;
use tessera_core::repository::{
    BookmarkRepository, EventRepository, ReservationRepository, UserRepository,
};
use tessera_core::reservation::{Reservation, ReserveSeat};
use tessera_core::user::{NewUser, User};

/// In-process store backing tests and local development.
///
/// The exclusive event lock of the Postgres store (`SELECT ... FOR UPDATE`)
/// becomes a keyed async mutex here: one entry per event, acquired for the
/// whole check-insert-decrement section, so concurrent reserves on the same
/// event are totally ordered exactly as they are against the database.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    events: RwLock<HashMap<Uuid, Event>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    bookmarks: RwLock<HashMap<Uuid, Bookmark>>,
    event_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn event_lock(&self, id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.event_locks.lock().unwrap();
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> CoreResult<User> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(CoreError::Conflict(format!(
                "email {} is already registered",
                user.email
            )));
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> CoreResult<bool> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .any(|u| u.email == email))
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: &Event) -> CoreResult<()> {
        self.events
            .write()
            .unwrap()
            .insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Event>> {
        Ok(self.events.read().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> CoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self.events.read().unwrap().values().cloned().collect();
        events.sort_by_key(|e| e.starts_at);
        Ok(events)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.events.write().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create(&self, cmd: ReserveSeat) -> CoreResult<Reservation> {
        // Per-event exclusive section, held until both writes are done.
        let lock = self.event_lock(cmd.event_id);
        let _guard = lock.lock().await;

        let reservation = {
            let mut events = self.events.write().unwrap();
            let event = events
                .get_mut(&cmd.event_id)
                .ok_or(CoreError::NotFound("event"))?;
            if event.available_attendees <= 0 {
                return Err(CoreError::CapacityExceeded {
                    event_id: cmd.event_id,
                });
            }
            event.available_attendees -= 1;
            Reservation {
                id: Uuid::new_v4(),
                user_id: cmd.user_id,
                event_id: cmd.event_id,
                booked_at: cmd.booked_at,
            }
        };

        self.reservations
            .write()
            .unwrap()
            .insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
        Ok(self.reservations.read().unwrap().get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .reservations
            .read()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.booked_at));
        Ok(rows)
    }

    async fn update_event(&self, id: Uuid, event_id: Uuid) -> CoreResult<Option<Reservation>> {
        let mut reservations = self.reservations.write().unwrap();
        Ok(reservations.get_mut(&id).map(|r| {
            r.event_id = event_id;
            r.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.reservations.write().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl BookmarkRepository for MemoryStore {
    async fn create(&self, bookmark: NewBookmark) -> CoreResult<Bookmark> {
        let created = Bookmark {
            id: Uuid::new_v4(),
            user_id: bookmark.user_id,
            event_id: bookmark.event_id,
            created_at: Utc::now(),
        };
        self.bookmarks
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<Option<Bookmark>> {
        Ok(self
            .bookmarks
            .read()
            .unwrap()
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Bookmark>> {
        let mut rows: Vec<Bookmark> = self
            .bookmarks
            .read()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|b| std::cmp::Reverse(b.created_at));
        Ok(rows)
    }

    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        let mut bookmarks = self.bookmarks.write().unwrap();
        match bookmarks.get(&id) {
            Some(b) if b.user_id == user_id => {
                bookmarks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
