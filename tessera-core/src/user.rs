use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::repository::UserRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration and credential checks. Hashes never leave this module
/// unverified; the raw password is dropped as soon as it is hashed.
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn register(&self, request: SignUp) -> CoreResult<User> {
        if self.users.exists_by_email(&request.email).await? {
            return Err(CoreError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: Role::User,
            })
            .await?;

        tracing::info!("user {} registered", user.id);
        Ok(user)
    }

    /// Verify email + password; the caller mints the session token.
    pub async fn authenticate(&self, email: &str, password: &str) -> CoreResult<User> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(CoreError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> CoreResult<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or(CoreError::NotFound("user"))
    }
}

fn hash_password(raw: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CoreError::store)
}

fn verify_password(raw: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;

    #[derive(Default)]
    struct TestUsers {
        rows: Mutex<HashMap<Uuid, User>>,
    }

    #[async_trait]
    impl UserRepository for TestUsers {
        async fn create(&self, user: NewUser) -> CoreResult<User> {
            let created = User {
                id: Uuid::new_v4(),
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role,
                created_at: Utc::now(),
            };
            self.rows.lock().unwrap().insert(created.id, created.clone());
            Ok(created)
        }

        async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn exists_by_email(&self, email: &str) -> CoreResult<bool> {
            Ok(self.find_by_email(email).await?.is_some())
        }
    }

    fn sign_up() -> SignUp {
        SignUp {
            name: "minjun".to_string(),
            email: "minjun3021@qwer.com".to_string(),
            password: "1234".to_string(),
        }
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("not-it", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_register_stores_a_hash_not_the_password() {
        let repo = Arc::new(TestUsers::default());
        let service = UserService::new(repo.clone());

        let user = service.register(sign_up()).await.unwrap();

        assert_eq!(user.email, "minjun3021@qwer.com");
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "1234");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_conflict() {
        let service = UserService::new(Arc::new(TestUsers::default()));

        service.register(sign_up()).await.unwrap();
        let err = service.register(sign_up()).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_authenticate_accepts_the_right_password_only() {
        let service = UserService::new(Arc::new(TestUsers::default()));
        service.register(sign_up()).await.unwrap();

        let user = service
            .authenticate("minjun3021@qwer.com", "1234")
            .await
            .unwrap();
        assert_eq!(user.email, "minjun3021@qwer.com");

        let err = service
            .authenticate("minjun3021@qwer.com", "4321")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));

        let err = service
            .authenticate("nobody@qwer.com", "1234")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidCredentials));
    }
}
