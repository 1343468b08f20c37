use crate::auth::{self, AuthError};
use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

pub mod api;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct User {
    id: Uuid,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Returns the ID of the user.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the normalized email.
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
        }
    }
}

/// Error type for UserService operations.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User with email '{0}' already exists")]
    EmailTaken(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User with ID {0} not found")]
    UserNotFound(Uuid),
    #[error("Credential error: {0}")]
    Auth(#[from] AuthError),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Lower-cases and trims an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct UserService<'a> {
    db: &'a sea_orm::DatabaseConnection,
}

impl UserService<'_> {
    pub fn new(db: &sea_orm::DatabaseConnection) -> UserService<'_> {
        UserService { db }
    }

    /// Registers a new user with a hashed password.
    ///
    /// Fails with `EmailTaken` when the normalized email already belongs to a user.
    #[tracing::instrument(skip(self, password))]
    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailTaken(email));
        }

        let password_hash = auth::hash_password_blocking(password.to_string()).await?;
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.trim().to_string()),
            email: ActiveValue::Set(email.clone()),
            password_hash: ActiveValue::Set(password_hash),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        match active_model.insert(self.db).await {
            Ok(model) => Ok(User::from(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(UserServiceError::EmailTaken(email))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Checks an email and password pair.
    ///
    /// Unknown emails and wrong passwords are indistinguishable to the caller.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let model = self
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        let matches =
            auth::verify_password_blocking(password.to_string(), model.password_hash.clone()).await?;
        if !matches {
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(User::from(model))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User, UserServiceError> {
        user::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .map(User::from)
            .ok_or(UserServiceError::UserNotFound(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, UserServiceError> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?;
        Ok(model)
    }
}
