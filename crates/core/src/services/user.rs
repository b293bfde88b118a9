//! User service: password sign-in and bearer tokens.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use mozsolidaria_common::{AppError, AppResult, IdGenerator};
use mozsolidaria_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials posted to the token exchange endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            display_name: model.display_name(),
            id: model.id,
            username: model.username,
            email: model.email,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
        }
    }
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_username(username).await
    }

    /// Authenticate a user by token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Authenticate a user by username and password.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Unauthorized)?;

        let password_hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
        if !verify_password(password, password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// An existing token is reused so several clients can share one account.
    pub async fn issue_token(&self, input: TokenRequest) -> AppResult<TokenResponse> {
        input.validate()?;

        let user = self.authenticate(&input.username, &input.password).await?;
        let token = user
            .token
            .clone()
            .unwrap_or_else(|| self.id_gen.generate_token());

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        active.last_login = Set(Some(chrono::Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Issued API token");

        Ok(TokenResponse {
            token,
            user: user.into(),
        })
    }
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mozsolidaria_db::test_utils;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3nha-forte").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3nha-forte", &hash).unwrap());
        assert!(!verify_password("errada", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut user = test_utils::user("u1", "joana");
        user.password_hash = Some(hash_password("certa").unwrap());

        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]));
        let result = svc.authenticate("joana", "errada").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_inactive_user() {
        let mut user = test_utils::user("u1", "joana");
        user.password_hash = Some(hash_password("certa").unwrap());
        user.is_active = false;

        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]));

        assert!(matches!(
            svc.authenticate("joana", "certa").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_issue_token_reuses_existing() {
        let mut user = test_utils::user("u1", "joana");
        user.password_hash = Some(hash_password("certa").unwrap());
        user.token = Some("tok123".to_string());

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_query_results([[user]]),
        );

        let response = svc
            .issue_token(TokenRequest {
                username: "joana".into(),
                password: "certa".into(),
            })
            .await
            .unwrap();

        assert_eq!(response.token, "tok123");
        assert_eq!(response.user.username, "joana");
    }
}
