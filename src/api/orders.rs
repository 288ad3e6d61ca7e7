// Order endpoints (all authenticated)

use serde::Deserialize;
use std::collections::HashMap;

use super::{authenticate, created_json, ok_json, parse_body, ApiError, ApiResult};
use crate::config::AppState;
use crate::http::{ApiRequest, HttpResponse};
use crate::model::{non_empty, Order, OrderRequest, OrderStatus, OrderView, Restaurant, RestaurantRef};
use crate::store::{Filter, StoreResult};

const NOT_FOUND: &str = "Order not found.";

#[derive(Debug, Default, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

/// Resolve each distinct restaurant once and attach `{_id, name}` to the orders.
async fn populate(state: &AppState, orders: Vec<Order>) -> StoreResult<Vec<OrderView>> {
    let mut restaurants: HashMap<String, Option<RestaurantRef>> = HashMap::new();
    for order in &orders {
        if !restaurants.contains_key(&order.restaurant) {
            let found = state.store.find::<Restaurant>(&order.restaurant).await?;
            restaurants.insert(order.restaurant.clone(), found.as_ref().map(RestaurantRef::from));
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let restaurant = restaurants.get(&order.restaurant).cloned().flatten();
            OrderView::new(order, restaurant)
        })
        .collect())
}

pub async fn create(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let identity = authenticate(req, state)?;
    let body: OrderRequest = parse_body(req)?;
    let (restaurant_id, items) = body.into_parts().map_err(ApiError::BadRequest)?;

    if state.store.find::<Restaurant>(&restaurant_id).await?.is_none() {
        return Err(ApiError::not_found("Restaurant not found."));
    }

    let order = Order::place(&identity.id, restaurant_id, items);
    state.store.insert(&order).await?;
    created_json(&order)
}

pub async fn mine(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let identity = authenticate(req, state)?;
    let orders = state
        .store
        .find_many::<Order>(Filter::Eq("user", &identity.id))
        .await?;
    ok_json(&populate(state, orders).await?)
}

pub async fn get(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    let identity = authenticate(req, state)?;
    let order = state
        .store
        .find::<Order>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if order.user != identity.id && !identity.is_admin() {
        return Err(ApiError::forbidden("Access denied."));
    }

    let view = populate(state, vec![order]).await?;
    ok_json(&view[0])
}

/// Admins may set any status; an absent or empty status keeps the current one.
pub async fn update_status(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    let identity = authenticate(req, state)?;
    let mut order = state
        .store
        .find::<Order>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if !identity.is_admin() {
        return Err(ApiError::forbidden("Only admin can update status."));
    }

    let body: StatusUpdate = parse_body(req)?;
    if let Some(status) = non_empty(body.status) {
        let status = status.parse::<OrderStatus>().map_err(ApiError::BadRequest)?;
        order.set_status(status);
        if !state.store.replace(&order).await? {
            return Err(ApiError::not_found(NOT_FOUND));
        }
    }
    ok_json(&order)
}
