//! Users table.
//!
//! Users are the merchants issuing receipts. The stored `password` is a salted
//! hash (see [`crate::auth`]) and doubles as the signing key of the user's
//! access tokens.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub check_symbols: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::checks::Entity")]
    Checks,
}

impl Related<super::checks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A registered user, as exposed by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Stored password hash.
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub check_symbols: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            password: model.password,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            phone_number: model.phone_number,
            check_symbols: model.check_symbols,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Data needed to register a new user.
#[derive(Clone, Debug, Default)]
pub struct UserNew {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
}

/// Profile fields that can be patched. `None` leaves the stored value as is.
#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub check_symbols: Option<i32>,
}
