use std::net::SocketAddr;
use std::sync::Arc;

use tessera_api::{
    app,
    state::{AppState, AuthConfig},
};
use tessera_core::bookmark::BookmarkService;
use tessera_core::event::EventService;
use tessera_core::repository::{
    BookmarkRepository, EventRepository, ReservationRepository, UserRepository,
};
use tessera_core::reservation::ReservationService;
use tessera_core::user::UserService;
use tessera_core::SystemClock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tessera_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Tessera API on port {}", config.server.port);

    let db = tessera_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let users: Arc<dyn UserRepository> =
        Arc::new(tessera_store::PgUserRepository::new(db.pool.clone()));
    let events: Arc<dyn EventRepository> =
        Arc::new(tessera_store::PgEventRepository::new(db.pool.clone()));
    let reservations: Arc<dyn ReservationRepository> =
        Arc::new(tessera_store::PgReservationRepository::new(db.pool.clone()));
    let bookmarks: Arc<dyn BookmarkRepository> =
        Arc::new(tessera_store::PgBookmarkRepository::new(db.pool.clone()));

    let app_state = AppState {
        users: Arc::new(UserService::new(users.clone())),
        events: Arc::new(EventService::new(events.clone())),
        reservations: Arc::new(ReservationService::new(
            users.clone(),
            events.clone(),
            reservations,
            Arc::new(SystemClock),
        )),
        bookmarks: Arc::new(BookmarkService::new(users, events, bookmarks)),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
