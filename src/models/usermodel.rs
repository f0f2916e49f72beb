use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    // Older clients still send "user" for a shopper account.
    #[serde(alias = "user")]
    Customer,
    Admin,
    Pharmacist,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Admin => "admin",
            UserRole::Pharmacist => "pharmacist",
        }
    }

    /// Parses a role name, accepting the legacy "user" alias.
    pub fn parse(value: &str) -> Option<UserRole> {
        match value.trim().to_lowercase().as_str() {
            "customer" | "user" => Some(UserRole::Customer),
            "admin" => Some(UserRole::Admin),
            "pharmacist" => Some(UserRole::Pharmacist),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Pharmacist)
    }
}

pub const STAFF_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Pharmacist];
pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin];

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub profile_pic: String,
    pub is_blocked: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
