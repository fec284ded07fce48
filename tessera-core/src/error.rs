/// Core error taxonomy shared by services and repositories
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("event {event_id} has no seats left")]
    CapacityExceeded { event_id: uuid::Uuid },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Store(String),
}

impl CoreError {
    /// Wrap a transport/SQL failure without forcing a driver dependency here
    pub fn store(err: impl std::fmt::Display) -> Self {
        CoreError::Store(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
