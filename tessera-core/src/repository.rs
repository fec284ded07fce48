use async_trait::async_trait;
use uuid::Uuid;

use crate::bookmark::{Bookmark, NewBookmark};
use crate::error::CoreResult;
use crate::event::Event;
use crate::reservation::{Reservation, ReserveSeat};
use crate::user::{NewUser, User};

/// Identity lookup consumed by the reservation coordinator.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> CoreResult<User>;
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> CoreResult<bool>;
}

/// Event catalog and capacity store.
///
/// `find_by_id` is the plain, lock-free read used by browse/update/bookmark
/// paths. The exclusive locked read of an event row is not exposed here: it
/// only exists inside `ReservationRepository::create`, scoped to that
/// transaction, so no caller can hold a row lock across an await point it
/// does not own.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: &Event) -> CoreResult<()>;
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Event>>;
    async fn list(&self) -> CoreResult<Vec<Event>>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}

/// Reservation ledger: one row per consumed seat.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// The atomic reserve unit. Implementations must, inside one transaction:
    /// acquire the event row under an exclusive lock, fail `NotFound` if the
    /// event is absent, fail `CapacityExceeded` without writing if
    /// `available_attendees == 0`, otherwise insert the ledger row and
    /// decrement `available_attendees`, committing both writes or neither.
    /// The lock must be held until commit; releasing it earlier re-opens the
    /// oversell race.
    async fn create(&self, cmd: ReserveSeat) -> CoreResult<Reservation>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Reservation>>;
    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Reservation>>;

    /// Repoint the ledger row at a different event. Capacity counters are
    /// deliberately untouched on both events (see DESIGN.md).
    async fn update_event(&self, id: Uuid, event_id: Uuid) -> CoreResult<Option<Reservation>>;

    /// Returns whether a row was removed. Does not restore capacity.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn create(&self, bookmark: NewBookmark) -> CoreResult<Bookmark>;
    async fn find_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<Option<Bookmark>>;
    async fn list_by_user(&self, user_id: Uuid) -> CoreResult<Vec<Bookmark>>;
    async fn delete_by_id_and_user(&self, id: Uuid, user_id: Uuid) -> CoreResult<bool>;
}
