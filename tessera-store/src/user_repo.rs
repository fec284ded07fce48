use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use tessera_core::error::{CoreError, CoreResult};
use tessera_core::repository::UserRepository;
use tessera_core::user::{NewUser, Role, User};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl UserRow {
    fn into_user(self) -> CoreResult<User> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| CoreError::Store(format!("unknown role {}", self.role)))?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> CoreResult<User> {
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(created.id)
        .bind(&created.name)
        .bind(&created.email)
        .bind(&created.password_hash)
        .bind(created.role.as_str())
        .bind(created.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // the unique index on email backs the service-level check
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                CoreError::Conflict(format!("email {} is already registered", created.email))
            } else {
                CoreError::store(e)
            }
        })?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoreError::store)?;
        row.map(UserRow::into_user).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> CoreResult<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(CoreError::store)?;
        Ok(row.0)
    }
}
