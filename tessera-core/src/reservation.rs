use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, CoreResult};
use crate::repository::{EventRepository, ReservationRepository, UserRepository};

/// A single user's claim on one unit of an event's capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub booked_at: DateTime<Utc>,
}

/// Command for the atomic reserve unit. `booked_at` is stamped by the
/// coordinator so the ledger never reads time on its own.
#[derive(Debug, Clone)]
pub struct ReserveSeat {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub booked_at: DateTime<Utc>,
}

/// Reservation coordinator.
///
/// Guarantees at most `max_attendees` concurrent successful reservations per
/// event, with exactly one ledger row per success. The serialization itself
/// lives in `ReservationRepository::create`, which holds the event's
/// exclusive lock across check + insert + decrement + commit; this service
/// owns everything around it: identity resolution, timestamping, and the
/// non-contended read paths.
pub struct ReservationService {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    reservations: Arc<dyn ReservationRepository>,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        reservations: Arc<dyn ReservationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            events,
            reservations,
            clock,
        }
    }

    pub async fn create(&self, event_id: Uuid, user_id: Uuid) -> CoreResult<Reservation> {
        // 1. Resolve the caller before touching any event state
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        // 2. Timestamp from the injected clock
        let booked_at = self.clock.now();

        // 3. Lock, check, insert, decrement: one transaction inside the ledger
        let reservation = self
            .reservations
            .create(ReserveSeat {
                event_id,
                user_id: user.id,
                booked_at,
            })
            .await?;

        tracing::info!(
            "reservation {} confirmed for event {}",
            reservation.id,
            event_id
        );
        Ok(reservation)
    }

    pub async fn get(&self, reservation_id: Uuid) -> CoreResult<Reservation> {
        self.reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Reservation>> {
        self.reservations.list_by_user(user_id).await
    }

    /// Repoint an existing reservation at a different event.
    ///
    /// The target is read without a lock and no capacity moves on either
    /// event: the old seat stays consumed, the new one is not decremented.
    /// That asymmetry is the recorded product behavior, kept on purpose
    /// (DESIGN.md) rather than silently patched.
    pub async fn update(&self, reservation_id: Uuid, new_event_id: Uuid) -> CoreResult<Reservation> {
        self.reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))?;

        let event = self
            .events
            .find_by_id(new_event_id)
            .await?
            .ok_or(CoreError::NotFound("event"))?;

        self.reservations
            .update_event(reservation_id, event.id)
            .await?
            .ok_or(CoreError::NotFound("reservation"))
    }

    /// Remove the ledger row. Capacity is not restored (DESIGN.md).
    pub async fn delete(&self, reservation_id: Uuid) -> CoreResult<()> {
        if self.reservations.delete(reservation_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound("reservation"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::clock::FixedClock;
    use crate::event::Event;
    use crate::user::{NewUser, Role, User};

    /// Single-threaded stand-in for the stores; the concurrent lock
    /// discipline is exercised against the real in-memory store in
    /// tessera-store.
    #[derive(Default)]
    struct TestStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        users: HashMap<Uuid, User>,
        events: HashMap<Uuid, Event>,
        reservations: HashMap<Uuid, Reservation>,
    }

    impl TestStore {
        fn add_user(&self) -> Uuid {
            let user = User {
                id: Uuid::new_v4(),
                name: "james".to_string(),
                email: format!("{}@example.com", Uuid::new_v4().simple()),
                password_hash: String::new(),
                role: Role::User,
                created_at: Utc::now(),
            };
            let id = user.id;
            self.inner.lock().unwrap().users.insert(id, user);
            id
        }

        fn add_event(&self, available: i32) -> Uuid {
            let event = Event {
                id: Uuid::new_v4(),
                title: "test title".to_string(),
                starts_at: Utc::now(),
                ends_at: Utc::now() + chrono::Duration::hours(2),
                max_attendees: 10,
                available_attendees: available,
            };
            let id = event.id;
            self.inner.lock().unwrap().events.insert(id, event);
            id
        }

        fn available(&self, event_id: Uuid) -> i32 {
            self.inner.lock().unwrap().events[&event_id].available_attendees
        }

        fn ledger_len(&self) -> usize {
            self.inner.lock().unwrap().reservations.len()
        }
    }

    #[async_trait]
    impl UserRepository for TestStore {
        async fn create(&self, _user: NewUser) -> CoreResult<User> {
            unimplemented!("not used by coordinator tests")
        }

        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
            Ok(self.inner.lock().unwrap().users.get(&id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .users
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn exists_by_email(&self, email: &str) -> CoreResult<bool> {
            Ok(self.find_by_email(email).await?.is_some())
        }
    }

    #[async_trait]
    impl EventRepository for TestStore {
        async fn insert(&self, event: &Event) -> CoreResult<()> {
            self.inner
                .lock()
                .unwrap()
                .events
                .insert(event.id, event.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Event>> {
            Ok(self.inner.lock().unwrap().events.get(&id).cloned())
        }

        async fn list(&self) -> CoreResult<Vec<Event>> {
            Ok(self.inner.lock().unwrap().events.values().cloned().collect())
        }

        async fn delete(&self, id: Uuid) -> CoreResult<bool> {
            Ok(self.inner.lock().unwrap().events.remove(&id).is_some())
        }
    }

    #[async_trait]
    impl ReservationRepository for TestStore {
        async fn create(&self, cmd: ReserveSeat) -> CoreResult<Reservation> {
            let mut inner = self.inner.lock().unwrap();
            let event = inner
                .events
                .get_mut(&cmd.event_id)
                .ok_or(CoreError::NotFound("event"))?;
            if event.available_attendees == 0 {
                return Err(CoreError::CapacityExceeded {
                    event_id: cmd.event_id,
                });
            }
            event.available_attendees -= 1;
            let reservation = Reservation {
                id: Uuid::new_v4(),
                user_id: cmd.user_id,
                event_id: cmd.event_id,
                booked_at: cmd.booked_at,
            };
            inner.reservations.insert(reservation.id, reservation.clone());
            Ok(reservation)
        }

        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
            Ok(self.inner.lock().unwrap().reservations.get(&id).cloned())
        }

        async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Reservation>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .reservations
                .values()
                .filter(|r| r.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn update_event(&self, id: Uuid, event_id: Uuid) -> CoreResult<Option<Reservation>> {
            let mut inner = self.inner.lock().unwrap();
            Ok(inner.reservations.get_mut(&id).map(|r| {
                r.event_id = event_id;
                r.clone()
            }))
        }

        async fn delete(&self, id: Uuid) -> CoreResult<bool> {
            Ok(self.inner.lock().unwrap().reservations.remove(&id).is_some())
        }
    }

    fn service_at(
        store: &Arc<TestStore>,
        instant: DateTime<Utc>,
    ) -> ReservationService {
        ReservationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FixedClock(instant)),
        )
    }

    fn test_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 8, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_stamps_injected_clock() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let event = store.add_event(3);

        let reservation = service.create(event, user).await.unwrap();

        assert_eq!(reservation.booked_at, test_instant());
        assert_eq!(store.available(event), 2);
    }

    #[tokio::test]
    async fn test_creates_at_same_instant_share_booked_at() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user_a = store.add_user();
        let user_b = store.add_user();
        let event = store.add_event(5);

        let first = service.create(event, user_a).await.unwrap();
        let second = service.create(event, user_b).await.unwrap();

        assert_eq!(first.booked_at, second.booked_at);
    }

    #[tokio::test]
    async fn test_create_for_unknown_user_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let event = store.add_event(1);

        let err = service.create(event, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound("user")));
        assert_eq!(store.available(event), 1);
        assert_eq!(store.ledger_len(), 0);
    }

    #[tokio::test]
    async fn test_create_for_unknown_event_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let other_event = store.add_event(4);

        let err = service.create(Uuid::new_v4(), user).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound("event")));
        // untouched bystander
        assert_eq!(store.available(other_event), 4);
        assert_eq!(store.ledger_len(), 0);
    }

    #[tokio::test]
    async fn test_create_on_sold_out_event_is_capacity_exceeded() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let event = store.add_event(0);

        let err = service.create(event, user).await.unwrap_err();

        assert!(matches!(err, CoreError::CapacityExceeded { .. }));
        assert_eq!(store.available(event), 0);
        assert_eq!(store.ledger_len(), 0);
    }

    #[tokio::test]
    async fn test_get_unknown_reservation_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());

        let err = service.get(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound("reservation")));
    }

    #[tokio::test]
    async fn test_update_repoints_without_moving_capacity() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let old_event = store.add_event(2);
        let new_event = store.add_event(2);

        let reservation = service.create(old_event, user).await.unwrap();
        assert_eq!(store.available(old_event), 1);

        let updated = service.update(reservation.id, new_event).await.unwrap();

        assert_eq!(updated.event_id, new_event);
        // old seat stays consumed, new event keeps every seat
        assert_eq!(store.available(old_event), 1);
        assert_eq!(store.available(new_event), 2);
    }

    #[tokio::test]
    async fn test_update_to_unknown_event_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let event = store.add_event(1);

        let reservation = service.create(event, user).await.unwrap();
        let err = service
            .update(reservation.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound("event")));
    }

    #[tokio::test]
    async fn test_update_unknown_reservation_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let event = store.add_event(1);

        let err = service.update(Uuid::new_v4(), event).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound("reservation")));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());
        let user = store.add_user();
        let event = store.add_event(1);

        let reservation = service.create(event, user).await.unwrap();
        service.delete(reservation.id).await.unwrap();

        let err = service.get(reservation.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound("reservation")));
        // deleting does not give the seat back
        assert_eq!(store.available(event), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_reservation_is_not_found() {
        let store = Arc::new(TestStore::default());
        let service = service_at(&store, test_instant());

        let err = service.delete(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound("reservation")));
    }
}
