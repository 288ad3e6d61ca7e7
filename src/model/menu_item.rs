use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{now, trimmed, update_optional, NumberLike};
use crate::store::{new_id, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning restaurant id
    pub restaurant: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_available() -> bool {
    true
}

impl Record for MenuItem {
    const COLLECTION: &'static str = "MenuItems";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub restaurant: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<NumberLike>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

fn parse_price(price: &NumberLike) -> Result<f64, String> {
    price
        .as_f64()
        .filter(|p| *p >= 0.0)
        .ok_or_else(|| "Price must be a non-negative number.".to_string())
}

impl MenuItemInput {
    /// Restaurant id named by the body, if any.
    pub fn restaurant_id(&self) -> Option<&str> {
        self.restaurant.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn create(self) -> Result<MenuItem, String> {
        let restaurant = self.restaurant_id().map(ToString::to_string);
        let (Some(restaurant), Some(name), Some(price)) =
            (restaurant, trimmed(self.name), self.price.as_ref())
        else {
            return Err("Restaurant, name and price are required.".to_string());
        };
        let price = parse_price(price)?;

        let ts = now();
        let mut item = MenuItem {
            id: new_id(),
            restaurant,
            name,
            description: None,
            price,
            image_url: None,
            is_available: self.is_available.unwrap_or(true),
            created_at: ts,
            updated_at: ts,
        };
        update_optional(&mut item.description, self.description);
        update_optional(&mut item.image_url, self.image_url);
        Ok(item)
    }

    /// Apply the fields present in the body. Moving an item to another
    /// restaurant is allowed; the caller checks that it exists.
    pub fn apply(self, item: &mut MenuItem) -> Result<(), String> {
        let restaurant = self.restaurant_id().map(ToString::to_string);
        let price = self.price.as_ref().map(parse_price).transpose()?;
        let name = self.name.map(|n| n.trim().to_string());
        if name.as_deref() == Some("") {
            return Err("Name cannot be empty.".to_string());
        }

        if let Some(restaurant) = restaurant {
            item.restaurant = restaurant;
        }
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(price) = price {
            item.price = price;
        }
        update_optional(&mut item.description, self.description);
        update_optional(&mut item.image_url, self.image_url);
        if let Some(available) = self.is_available {
            item.is_available = available;
        }
        item.updated_at = now();
        Ok(())
    }
}
