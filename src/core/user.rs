//! User accounts, roles and password checks.
//!
//! Passwords are stored as bcrypt hashes. At least one administrator must
//! exist at all times, so deleting the last one is refused.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument, warn};

#[cfg(not(test))]
const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const PASSWORD_COST: u32 = 4;

/// What a logged-in user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Manages users, classrooms, students and subjects
    Admin,
    /// Marks attendance and reads reports
    Teacher,
}

impl Role {
    /// The form persisted in the `users.role` column.
    #[must_use]
    pub const fn as_stored(self) -> &'static str {
        match self {
            Self::Admin => "ROLE_ADMIN",
            Self::Teacher => "ROLE_TEACHER",
        }
    }

    /// Creating and deleting accounts.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Classroom, student and subject mutations, plus attendance reset.
    #[must_use]
    pub const fn can_manage_roster(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Taking and saving attendance sessions.
    #[must_use]
    pub const fn can_mark_attendance(self) -> bool {
        matches!(self, Self::Admin | Self::Teacher)
    }

    /// Summaries, student reports and workbook export.
    #[must_use]
    pub const fn can_view_reports(self) -> bool {
        matches!(self, Self::Admin | Self::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Teacher => write!(f, "TEACHER"),
        }
    }
}

/// Accepts `ADMIN`, `ROLE_ADMIN`, `teacher`, ... in any case.
impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("ROLE_").unwrap_or(&upper) {
            "ADMIN" => Ok(Self::Admin),
            "TEACHER" => Ok(Self::Teacher),
            _ => Err(Error::Validation {
                message: format!("Unknown role '{}'", s.trim()),
            }),
        }
    }
}

/// Role of a stored user row.
pub fn user_role(user: &user::Model) -> Result<Role> {
    user.role.parse()
}

/// Retrieves all users ordered by username
pub async fn get_all_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by primary key.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by exact username.
pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Number of users holding the admin role.
pub async fn count_admins(db: &DatabaseConnection) -> Result<u64> {
    User::find()
        .filter(user::Column::Role.eq(Role::Admin.as_stored()))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates a user with a freshly hashed password.
///
/// # Errors
/// [`Error::Validation`] for a blank username or password,
/// [`Error::DuplicateUsername`] if the name is taken.
#[instrument(skip(db, password))]
pub async fn create_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    role: Role,
) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }
    if password.is_empty() {
        return Err(Error::Validation {
            message: "Password cannot be empty".to_string(),
        });
    }
    if get_user_by_username(db, username).await?.is_some() {
        return Err(Error::DuplicateUsername {
            username: username.to_string(),
        });
    }

    let password = password.to_string();
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_COST)).await??;

    let user = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.as_stored().to_string()),
        ..Default::default()
    };

    let result = user.insert(db).await?;
    info!("Created user '{}' with role {}", result.username, role);
    Ok(result)
}

/// Deletes a user, refusing to remove the only administrator.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            key: user_id.to_string(),
        })?;

    if user_role(&user).ok() == Some(Role::Admin) && count_admins(db).await? <= 1 {
        warn!("Refused to delete last admin '{}'", user.username);
        return Err(Error::LastAdmin);
    }

    User::delete_by_id(user_id).exec(db).await?;
    info!("Deleted user '{}'", user.username);
    Ok(user)
}

/// Checks a username/password pair.
///
/// Unknown users and wrong passwords produce the same error.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<(user::Model, Role)> {
    let Some(user) = get_user_by_username(db, username.trim()).await? else {
        return Err(Error::InvalidCredentials);
    };
    let (password, hash) = (password.to_string(), user.password_hash.clone());
    if !tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?? {
        return Err(Error::InvalidCredentials);
    }
    let role = user_role(&user)?;
    Ok((user, role))
}
