use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{now, NumberLike, Restaurant};
use crate::store::{new_id, Record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Delivering,
        Self::Completed,
        Self::Cancelled,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {s}"))
    }
}

/// One cart line, copied into the order at placement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_item: Option<String>,
    #[serde(default)]
    pub name: String,
    pub price: f64,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    /// Ordering user id
    pub user: String,
    /// Restaurant id
    pub restaurant: String,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Order {
    const COLLECTION: &'static str = "Orders";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Order {
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = now();
    }
}

/// Sum of `price × qty` over the lines, rounded to cents.
pub fn order_total(items: &[OrderItem]) -> f64 {
    let total: f64 = items
        .iter()
        .map(|item| item.price * f64::from(item.qty))
        .sum();
    (total * 100.0).round() / 100.0
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub menu_item: Option<String>,
    pub name: Option<String>,
    pub price: Option<NumberLike>,
    pub qty: Option<NumberLike>,
}

impl OrderItemInput {
    /// Missing price counts as 0 and missing quantity as 1.
    fn into_item(self) -> Result<OrderItem, String> {
        let price = match &self.price {
            None => 0.0,
            Some(p) => p
                .as_f64()
                .filter(|p| *p >= 0.0)
                .ok_or_else(|| "Invalid item price.".to_string())?,
        };
        let qty = match &self.qty {
            None => 1,
            Some(q) => q
                .as_f64()
                .filter(|q| *q >= 1.0 && q.fract() == 0.0 && *q <= f64::from(u32::MAX))
                .map(|q| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let qty = q as u32;
                    qty
                })
                .ok_or_else(|| "Invalid item quantity.".to_string())?,
        };
        Ok(OrderItem {
            menu_item: self.menu_item.filter(|m| !m.is_empty()),
            name: self.name.unwrap_or_default(),
            price,
            qty,
        })
    }
}

/// Body of `POST /api/orders`: the client's finished cart.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
}

impl OrderRequest {
    /// Validate the cart and return the restaurant id and order lines.
    pub fn into_parts(self) -> Result<(String, Vec<OrderItem>), String> {
        if self.items.is_empty() {
            return Err("Order items required.".to_string());
        }
        let restaurant = self
            .restaurant_id
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| "Restaurant is required.".to_string())?;
        let items = self
            .items
            .into_iter()
            .map(OrderItemInput::into_item)
            .collect::<Result<Vec<_>, _>>()?;
        if !order_total(&items).is_finite() {
            return Err("Invalid item price.".to_string());
        }
        Ok((restaurant, items))
    }
}

impl Order {
    pub fn place(user: &str, restaurant: String, items: Vec<OrderItem>) -> Self {
        let ts = now();
        Self {
            id: new_id(),
            user: user.to_string(),
            restaurant,
            total_price: order_total(&items),
            items,
            status: OrderStatus::Pending,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// Restaurant summary embedded in order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl From<&Restaurant> for RestaurantRef {
    fn from(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id.clone(),
            name: restaurant.name.clone(),
        }
    }
}

/// Order with its restaurant resolved to `{_id, name}` (null once deleted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub restaurant: Option<RestaurantRef>,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    pub fn new(order: Order, restaurant: Option<RestaurantRef>) -> Self {
        Self {
            id: order.id,
            user: order.user,
            restaurant,
            items: order.items,
            total_price: order.total_price,
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> OrderRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_total_uses_defaults_and_rounds() {
        let (_, items) = request(
            r#"{"restaurantId":"r1","items":[
                {"menuItem":"m1","name":"Pho","price":9.99,"qty":3},
                {"menuItem":"m2","name":"Tea","price":"0.1"},
                {"name":"Napkins"}
            ]}"#,
        )
        .into_parts()
        .unwrap();
        assert_eq!(items[1].qty, 1);
        assert!(items[2].price.abs() < f64::EPSILON);
        assert!((order_total(&items) - 30.07).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = request(r#"{"restaurantId":"r1","items":[]}"#)
            .into_parts()
            .unwrap_err();
        assert_eq!(err, "Order items required.");
        assert!(request(r#"{"restaurantId":"r1"}"#).into_parts().is_err());
    }

    #[test]
    fn test_missing_restaurant_rejected() {
        let err = request(r#"{"items":[{"name":"Pho","price":9,"qty":1}]}"#)
            .into_parts()
            .unwrap_err();
        assert_eq!(err, "Restaurant is required.");
    }

    #[test]
    fn test_invalid_lines_rejected() {
        for line in [
            r#"{"price":-1,"qty":1}"#,
            r#"{"price":1,"qty":0}"#,
            r#"{"price":1,"qty":1.5}"#,
            r#"{"price":"abc","qty":1}"#,
            r#"{"price":1e308,"qty":10}"#,
        ] {
            let json = format!(r#"{{"restaurantId":"r1","items":[{line}]}}"#);
            assert!(request(&json).into_parts().is_err(), "accepted {line}");
        }
    }

    #[test]
    fn test_total_must_stay_finite() {
        let json = r#"{"restaurantId":"r1","items":[{"price":1e308},{"price":1e308}]}"#;
        assert_eq!(request(json).into_parts().unwrap_err(), "Invalid item price.");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("delivering".parse::<OrderStatus>(), Ok(OrderStatus::Delivering));
        assert!("shipped".parse::<OrderStatus>().is_err());
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_place_sets_pending_and_total() {
        let items = vec![OrderItem {
            menu_item: Some("m1".into()),
            name: "Pho".into(),
            price: 4.5,
            qty: 2,
        }];
        let order = Order::place("u1", "r1".into(), items);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!((order.total_price - 9.0).abs() < f64::EPSILON);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["menuItem"], "m1");
        assert_eq!(json["totalPrice"], 9.0);
    }
}
