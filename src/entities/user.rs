//! User entity - Login accounts for administrators and teachers.
//!
//! The role column holds the prefixed form (`ROLE_ADMIN`, `ROLE_TEACHER`);
//! use [`crate::core::user::Role`] to interpret it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across all users
    #[sea_orm(unique)]
    pub username: String,
    /// bcrypt hash of the password; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Stored role string, e.g. `"ROLE_ADMIN"`
    pub role: String,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
