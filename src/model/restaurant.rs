use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{now, trimmed, update_optional};
use crate::store::{new_id, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_open")]
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_open() -> bool {
    true
}

impl Record for Restaurant {
    const COLLECTION: &'static str = "Restaurants";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Request body for creating or updating a restaurant.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub cuisine_type: Option<String>,
    pub image_url: Option<String>,
    pub is_open: Option<bool>,
}

impl RestaurantInput {
    pub fn create(self) -> Result<Restaurant, String> {
        let (Some(name), Some(address)) = (trimmed(self.name), trimmed(self.address)) else {
            return Err("Name and address are required.".to_string());
        };
        let ts = now();
        let mut restaurant = Restaurant {
            id: new_id(),
            name,
            address,
            phone: None,
            cuisine_type: None,
            image_url: None,
            is_open: self.is_open.unwrap_or(true),
            created_at: ts,
            updated_at: ts,
        };
        update_optional(&mut restaurant.phone, self.phone);
        update_optional(&mut restaurant.cuisine_type, self.cuisine_type);
        update_optional(&mut restaurant.image_url, self.image_url);
        Ok(restaurant)
    }

    /// Apply the fields present in the body.
    pub fn apply(self, restaurant: &mut Restaurant) -> Result<(), String> {
        let name = self.name.map(|n| n.trim().to_string());
        let address = self.address.map(|a| a.trim().to_string());
        if name.as_deref() == Some("") || address.as_deref() == Some("") {
            return Err("Name and address cannot be empty.".to_string());
        }

        if let Some(name) = name {
            restaurant.name = name;
        }
        if let Some(address) = address {
            restaurant.address = address;
        }
        update_optional(&mut restaurant.phone, self.phone);
        update_optional(&mut restaurant.cuisine_type, self.cuisine_type);
        update_optional(&mut restaurant.image_url, self.image_url);
        if let Some(open) = self.is_open {
            restaurant.is_open = open;
        }
        restaurant.updated_at = now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: &str) -> RestaurantInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_create_requires_name_and_address() {
        assert!(input(r#"{"name":"Pho 88"}"#).create().is_err());
        assert!(input(r#"{"name":"  ","address":"1 Main"}"#).create().is_err());

        let r = input(r#"{"name":" Pho 88 ","address":"1 Main","cuisineType":"Vietnamese"}"#)
            .create()
            .unwrap();
        assert_eq!(r.name, "Pho 88");
        assert_eq!(r.cuisine_type.as_deref(), Some("Vietnamese"));
        assert!(r.is_open);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut r = input(r#"{"name":"Pho 88","address":"1 Main","phone":"555"}"#)
            .create()
            .unwrap();
        input(r#"{"isOpen":false,"phone":"","imageUrl":"/api/images/x"}"#)
            .apply(&mut r)
            .unwrap();
        assert!(!r.is_open);
        assert_eq!(r.phone, None);
        assert_eq!(r.image_url.as_deref(), Some("/api/images/x"));
        assert_eq!(r.name, "Pho 88");

        assert!(input(r#"{"name":""}"#).apply(&mut r).is_err());
    }

    #[test]
    fn test_json_shape() {
        let r = input(r#"{"name":"Pho 88","address":"1 Main"}"#).create().unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["isOpen"], true);
        assert!(json.get("phone").is_none());
        assert!(json["_id"].is_string());
        assert!(json["updatedAt"].is_string());
    }
}
