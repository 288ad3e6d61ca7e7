use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{non_empty, now, trimmed};
use crate::store::{new_id, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Invalid role: {other}")),
        }
    }
}

/// Stored user document, including the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    const COLLECTION: &'static str = "Users";
    const UNIQUE: &'static [&'static str] = &["email"];

    fn id(&self) -> &str {
        &self.id
    }
}

impl User {
    /// New customer account. Name is trimmed and email normalized.
    pub fn new(
        name: &str,
        email: &str,
        password_hash: String,
        address: Option<String>,
        phone: Option<String>,
    ) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            address: non_empty(address),
            phone: non_empty(phone),
            role: Role::Customer,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn view(&self) -> UserView {
        UserView::from(self)
    }

    pub fn token_user(&self) -> TokenUser {
        TokenUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as returned to clients: everything except the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact user summary embedded in auth responses and token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Self-service profile update. Empty fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    /// Apply everything except the password, which the caller hashes.
    /// Returns the new password if one was supplied.
    pub fn apply(self, user: &mut User) -> Option<String> {
        if let Some(name) = trimmed(self.name) {
            user.name = name;
        }
        if let Some(address) = non_empty(self.address) {
            user.address = Some(address);
        }
        if let Some(phone) = non_empty(self.phone) {
            user.phone = Some(phone);
        }
        user.updated_at = now();
        non_empty(self.password)
    }
}

/// Admin update of any user. Empty fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) -> Result<(), String> {
        let role = non_empty(self.role)
            .map(|r| r.parse::<Role>())
            .transpose()?;

        if let Some(name) = trimmed(self.name) {
            user.name = name;
        }
        if let Some(email) = trimmed(self.email) {
            user.email = normalize_email(&email);
        }
        if let Some(address) = non_empty(self.address) {
            user.address = Some(address);
        }
        if let Some(phone) = non_empty(self.phone) {
            user.phone = Some(phone);
        }
        if let Some(role) = role {
            user.role = role;
        }
        user.updated_at = now();
        Ok(())
    }
}
