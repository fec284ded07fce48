use std::sync::Arc;

use tessera_core::bookmark::BookmarkService;
use tessera_core::event::EventService;
use tessera_core::reservation::ReservationService;
use tessera_core::user::UserService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub events: Arc<EventService>,
    pub reservations: Arc<ReservationService>,
    pub bookmarks: Arc<BookmarkService>,
    pub auth: AuthConfig,
}
