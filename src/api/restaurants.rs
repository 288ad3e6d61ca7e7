// Restaurant endpoints: public reads, admin writes

use serde_json::json;

use super::{created_json, ok_json, parse_body, require_admin, ApiError, ApiResult};
use crate::config::AppState;
use crate::http::{ApiRequest, HttpResponse};
use crate::model::{Restaurant, RestaurantInput};
use crate::store::Filter;

const NOT_FOUND: &str = "Restaurant not found.";

pub async fn list(state: &AppState) -> ApiResult<HttpResponse> {
    let restaurants = state.store.find_many::<Restaurant>(Filter::All).await?;
    ok_json(&restaurants)
}

pub async fn create(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let input: RestaurantInput = parse_body(req)?;
    let restaurant = input.create().map_err(ApiError::BadRequest)?;
    state.store.insert(&restaurant).await?;
    created_json(&restaurant)
}

pub async fn get(state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    let restaurant = state
        .store
        .find::<Restaurant>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    ok_json(&restaurant)
}

pub async fn update(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let input: RestaurantInput = parse_body(req)?;
    let mut restaurant = state
        .store
        .find::<Restaurant>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    input.apply(&mut restaurant).map_err(ApiError::BadRequest)?;
    if !state.store.replace(&restaurant).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&restaurant)
}

/// Menu items and past orders keep their restaurant id; order listings
/// show a deleted restaurant as `null`.
pub async fn delete(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    if !state.store.delete::<Restaurant>(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&json!({ "message": "Restaurant deleted." }))
}
