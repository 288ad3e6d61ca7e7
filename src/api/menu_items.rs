// Menu item endpoints

use serde_json::json;

use super::{created_json, ok_json, parse_body, require_admin, ApiError, ApiResult};
use crate::config::AppState;
use crate::http::{ApiRequest, HttpResponse};
use crate::model::{MenuItem, MenuItemInput, Restaurant};
use crate::store::Filter;

const NOT_FOUND: &str = "Menu item not found.";

async fn ensure_restaurant(state: &AppState, id: &str) -> ApiResult<()> {
    match state.store.find::<Restaurant>(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Restaurant not found.")),
    }
}

pub async fn list_for_restaurant(state: &AppState, restaurant_id: &str) -> ApiResult<HttpResponse> {
    let items = state
        .store
        .find_many::<MenuItem>(Filter::Eq("restaurant", restaurant_id))
        .await?;
    ok_json(&items)
}

pub async fn create(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let input: MenuItemInput = parse_body(req)?;
    let item = input.create().map_err(ApiError::BadRequest)?;
    ensure_restaurant(state, &item.restaurant).await?;
    state.store.insert(&item).await?;
    created_json(&item)
}

pub async fn update(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let input: MenuItemInput = parse_body(req)?;
    let mut item = state
        .store
        .find::<MenuItem>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    if let Some(restaurant_id) = input.restaurant_id() {
        if restaurant_id != item.restaurant {
            ensure_restaurant(state, restaurant_id).await?;
        }
    }
    input.apply(&mut item).map_err(ApiError::BadRequest)?;
    if !state.store.replace(&item).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&item)
}

pub async fn delete(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    if !state.store.delete::<MenuItem>(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&json!({ "message": "Menu item deleted." }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{admin, call, register, restaurant, state};
    use hyper::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::config::AppState;

    async fn create_item(state: &AppState, token: &str, body: Value) -> (StatusCode, Value) {
        call(state, Method::POST, "/api/menuitems", Some(token), Some(body)).await
    }

    #[tokio::test]
    async fn test_create_and_list_by_restaurant() {
        let state = state();
        let token = admin(&state).await;
        let pho = restaurant(&state, &token, "Pho 88").await;
        let taco = restaurant(&state, &token, "Taco Town").await;

        let (status, body) = create_item(
            &state,
            &token,
            json!({ "restaurant": pho, "name": "Pho Tai", "price": "11.50" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["price"], 11.5);
        assert_eq!(body["isAvailable"], true);

        create_item(&state, &token, json!({ "restaurant": taco, "name": "Al Pastor", "price": 4 })).await;

        let (status, body) = call(
            &state,
            Method::GET,
            &format!("/api/menuitems/restaurant/{pho}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Pho Tai");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let state = state();
        let token = admin(&state).await;
        let pho = restaurant(&state, &token, "Pho 88").await;

        let (status, body) = create_item(&state, &token, json!({ "restaurant": pho, "name": "Pho" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Restaurant, name and price are required.");

        let (status, body) =
            create_item(&state, &token, json!({ "restaurant": pho, "name": "Pho", "price": -2 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Price must be a non-negative number.");

        let (status, body) = create_item(
            &state,
            &token,
            json!({ "restaurant": "65f0c0ffee0000000000abcd", "name": "Pho", "price": 9 }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Restaurant not found.");
    }

    #[tokio::test]
    async fn test_customer_cannot_modify() {
        let state = state();
        let token = admin(&state).await;
        let pho = restaurant(&state, &token, "Pho 88").await;
        let (customer, _) = register(&state, "Cam", "cam@example.com").await;

        let (status, _) =
            create_item(&state, &customer, json!({ "restaurant": pho, "name": "Pho", "price": 9 })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let state = state();
        let token = admin(&state).await;
        let pho = restaurant(&state, &token, "Pho 88").await;
        let (_, item) =
            create_item(&state, &token, json!({ "restaurant": pho, "name": "Pho", "price": 9 })).await;
        let uri = format!("/api/menuitems/{}", item["_id"].as_str().unwrap());

        let (status, body) = call(
            &state,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "price": 10.25, "isAvailable": false, "description": "Beef noodle soup" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], 10.25);
        assert_eq!(body["isAvailable"], false);
        assert_eq!(body["description"], "Beef noodle soup");

        let (status, body) = call(
            &state,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "restaurant": "65f0c0ffee0000000000abcd" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Restaurant not found.");

        let (status, body) = call(&state, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Menu item deleted.");

        let (status, body) = call(&state, Method::PUT, &uri, Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Menu item not found.");
    }
}
