//! Signup, login, token refresh and the user directory.

use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tracing::{debug, info, instrument, warn};

use crate::auth::{PasswordHasher, TokenService};
use crate::error::{AppError, Result};
use crate::schemas::AppState;

/// Signup payload after request validation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Tokens handed out on a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    passwords: &'a PasswordHasher,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        passwords: &'a PasswordHasher,
        tokens: &'a TokenService,
    ) -> Self {
        Self { db, passwords, tokens }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.db, &state.passwords, &state.tokens)
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: NewUser) -> Result<user::Model> {
        let taken = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(new_user.username.as_str()))
                    .add(user::Column::Email.eq(new_user.email.as_str())),
            )
            .one(self.db)
            .await?;

        if let Some(existing) = taken {
            let message = if existing.username == new_user.username {
                format!("Username '{}' already exists", new_user.username)
            } else {
                format!("Email '{}' already exists", new_user.email)
            };
            warn!("Signup rejected: {}", message);
            return Err(AppError::Validation(message));
        }

        let password_hash = self.passwords.hash(&new_user.password)?;
        let active = user::ActiveModel {
            username: Set(new_user.username.clone()),
            email: Set(new_user.email.clone()),
            password_hash: Set(password_hash),
            is_staff: Set(false),
            is_active: Set(false),
            ..Default::default()
        };

        match active.insert(self.db).await {
            Ok(created) => {
                info!("User created with ID: {}, username: {}", created.id, created.username);
                Ok(created)
            }
            // Lost a race with a concurrent signup for the same name or email
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                warn!("Signup for '{}' hit a unique constraint: {}", new_user.username, err);
                Err(AppError::Validation(
                    "Username or email already exists".to_string(),
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Unknown email and wrong password fail the same way.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let Some(found) = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?
        else {
            warn!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &found.password_hash)? {
            warn!("Failed login attempt for {}", found.username);
            return Err(AppError::InvalidCredentials);
        }

        let pair = TokenPair {
            access_token: self.tokens.issue_access_token(&found.username)?,
            refresh_token: self.tokens.issue_refresh_token(&found.username)?,
        };
        info!("Login successful: {} ({})", found.username, found.id);
        Ok(pair)
    }

    pub fn refresh(&self, username: &str) -> Result<String> {
        debug!("Refreshing access token for {}", username);
        self.tokens.issue_access_token(username)
    }

    pub async fn list_users(&self) -> Result<Vec<user::Model>> {
        Ok(user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn get_user(&self, user_id: i32) -> Result<user::Model> {
        user::Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_app_state;
    use crate::auth::jwt::TokenType;

    fn alice() -> NewUser {
        NewUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "pw1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let state = setup_test_app_state().await;
        let service = AuthService::from_state(&state);

        let created = service.register(alice()).await.unwrap();
        assert_eq!(created.username, "alice");
        assert_ne!(created.password_hash, "pw1");
        assert!(state.passwords.verify("pw1", &created.password_hash).unwrap());
        assert!(!created.is_staff);
        assert!(!created.is_active);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let state = setup_test_app_state().await;
        let service = AuthService::from_state(&state);
        service.register(alice()).await.unwrap();

        let same_email = NewUser {
            username: "alice2".to_string(),
            ..alice()
        };
        assert!(matches!(
            service.register(same_email).await,
            Err(AppError::Validation(msg)) if msg.contains("Email")
        ));

        let same_name = NewUser {
            email: "other@x.com".to_string(),
            ..alice()
        };
        assert!(matches!(
            service.register(same_name).await,
            Err(AppError::Validation(msg)) if msg.contains("Username")
        ));
    }

    #[tokio::test]
    async fn test_login_issues_tokens_for_username() {
        let state = setup_test_app_state().await;
        let service = AuthService::from_state(&state);
        service.register(alice()).await.unwrap();

        let pair = service.login("alice@x.com", "pw1").await.unwrap();
        let access = state.tokens.validate(&pair.access_token, TokenType::Access).unwrap();
        let refresh = state.tokens.validate(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert_eq!(access.sub, "alice");
        assert_eq!(refresh.sub, "alice");
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let state = setup_test_app_state().await;
        let service = AuthService::from_state(&state);
        service.register(alice()).await.unwrap();

        assert!(matches!(
            service.login("alice@x.com", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@x.com", "pw1").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let state = setup_test_app_state().await;
        let service = AuthService::from_state(&state);
        assert!(matches!(service.get_user(4242).await, Err(AppError::NotFound)));
    }
}
