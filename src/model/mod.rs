//! Domain documents
//!
//! Flat MealEase documents as they are stored and returned to clients.
//! JSON field names follow the client's camelCase convention with `_id`,
//! `createdAt` and `updatedAt` on every document.

mod image;
mod menu_item;
mod order;
mod restaurant;
mod user;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;

pub use image::Image;
pub use menu_item::{MenuItem, MenuItemInput};
pub use order::{Order, OrderRequest, OrderStatus, OrderView, RestaurantRef};
pub use restaurant::{Restaurant, RestaurantInput};
pub use user::{normalize_email, ProfilePatch, Role, TokenUser, User, UserPatch, UserView};

/// Current time at millisecond precision (what MongoDB keeps).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A numeric field that clients may send either as a JSON number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Keep a string only if it has content, like a truthiness check on form input.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Trimmed value, `None` if nothing is left.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Optional text field update: empty string clears, absent leaves unchanged.
pub(crate) fn update_optional(target: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *target = if v.is_empty() { None } else { Some(v) };
    }
}
