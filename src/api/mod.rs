//! MealEase REST API
//!
//! [`route`] dispatches a buffered request on its method and path segments to
//! the resource handlers. Handlers return [`ApiResult`]; failures are rendered
//! here as `{"message": "..."}` with the matching status code.

mod auth;
mod error;
mod health;
mod images;
mod menu_items;
mod orders;
mod restaurants;
mod users;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH};
use hyper::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Identity;
use crate::config::AppState;
use crate::http::{build_404_response, build_json_response, build_options_response, ApiRequest, HttpResponse};
use crate::logger;

pub use error::{ApiError, ApiResult};

/// API route handler
///
/// `OPTIONS` on any path answers the CORS preflight. `HEAD` runs the `GET`
/// handler and drops the body.
pub async fn route(req: &ApiRequest, state: &AppState) -> HttpResponse {
    if req.method == Method::OPTIONS {
        return build_options_response();
    }

    let is_head = req.method == Method::HEAD;
    let method = if is_head { Method::GET } else { req.method.clone() };
    let segments = req.segments();

    let result = match (method, segments.as_slice()) {
        // Root and probes
        (Method::GET, []) => health::root(),
        (Method::GET, ["healthz"]) => health::liveness(),
        (Method::GET, ["readyz"]) => health::readiness(state).await,

        // Account
        (Method::POST, ["auth", "register"]) => auth::register(req, state).await,
        (Method::POST, ["auth", "login"]) => auth::login(req, state).await,
        (Method::GET, ["auth", "me"]) => auth::profile(req, state).await,
        (Method::PUT, ["auth", "me"]) => auth::update_profile(req, state).await,
        (Method::DELETE, ["auth", "me"]) => auth::delete_account(req, state).await,

        // Restaurants
        (Method::GET, ["api", "restaurants"]) => restaurants::list(state).await,
        (Method::POST, ["api", "restaurants"]) => restaurants::create(req, state).await,
        (Method::GET, ["api", "restaurants", id]) => restaurants::get(state, id).await,
        (Method::PUT, ["api", "restaurants", id]) => restaurants::update(req, state, id).await,
        (Method::DELETE, ["api", "restaurants", id]) => {
            restaurants::delete(req, state, id).await
        }

        // Menu items
        (Method::GET, ["api", "menuitems", "restaurant", restaurant_id]) => {
            menu_items::list_for_restaurant(state, restaurant_id).await
        }
        (Method::POST, ["api", "menuitems"]) => menu_items::create(req, state).await,
        (Method::PUT, ["api", "menuitems", id]) => menu_items::update(req, state, id).await,
        (Method::DELETE, ["api", "menuitems", id]) => menu_items::delete(req, state, id).await,

        // Orders
        (Method::POST, ["api", "orders"]) => orders::create(req, state).await,
        (Method::GET, ["api", "orders", "my"]) => orders::mine(req, state).await,
        (Method::GET, ["api", "orders", id]) => orders::get(req, state, id).await,
        (Method::PUT, ["api", "orders", id, "status"]) => {
            orders::update_status(req, state, id).await
        }

        // Users (admin)
        (Method::GET, ["api", "users"]) => users::list(req, state).await,
        (Method::GET, ["api", "users", id]) => users::get(req, state, id).await,
        (Method::PUT, ["api", "users", id]) => users::update(req, state, id).await,
        (Method::DELETE, ["api", "users", id]) => users::delete(req, state, id).await,

        // Images
        (Method::POST, ["api", "upload", "image"]) => images::upload(req, state).await,
        (Method::GET, ["api", "images", id]) => images::get(state, id).await,

        // Unknown route
        _ => Ok(build_404_response()),
    };

    let mut response = result.unwrap_or_else(|err| {
        if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
            logger::log_error(&format!("{} {} failed: {err}", req.method, req.path));
        }
        err.into_response()
    });

    if is_head {
        if let Some(len) = response.body().size_hint().exact() {
            response
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        *response.body_mut() = Full::new(Bytes::new());
    }
    response
}

/// Parse the JSON body, mapping any failure to 400 `Invalid JSON body.`
fn parse_body<T: DeserializeOwned>(req: &ApiRequest) -> ApiResult<T> {
    req.json().map_err(|_| ApiError::invalid_json())
}

fn ok_json<T: Serialize + ?Sized>(value: &T) -> ApiResult<HttpResponse> {
    Ok(build_json_response(StatusCode::OK, value))
}

fn created_json<T: Serialize + ?Sized>(value: &T) -> ApiResult<HttpResponse> {
    Ok(build_json_response(StatusCode::CREATED, value))
}

/// Caller identity from the bearer token.
fn authenticate(req: &ApiRequest, state: &AppState) -> ApiResult<Identity> {
    Ok(state.tokens.authenticate(req.authorization())?)
}

fn require_admin(req: &ApiRequest, state: &AppState) -> ApiResult<Identity> {
    let identity = authenticate(req, state)?;
    if !identity.is_admin() {
        return Err(ApiError::forbidden("Admin access required."));
    }
    Ok(identity)
}

/// Request/response helpers shared by the handler tests.
#[cfg(test)]
pub(crate) mod testing {
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;

    use super::route;
    use crate::config::AppState;
    use crate::http::{collect, HttpResponse};
    use crate::model::{Role, User};

    pub fn state() -> Arc<AppState> {
        AppState::for_tests()
    }

    pub async fn send(state: &AppState, req: Request<Full<Bytes>>) -> HttpResponse {
        let req = collect(req, state.config.http.max_body_size).await.unwrap();
        route(&req, state).await
    }

    pub async fn body_bytes(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    /// Send a JSON request and decode the JSON reply.
    pub async fn call(
        state: &AppState,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let req = builder
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap();

        let response = send(state, req).await;
        let status = response.status();
        let bytes = body_bytes(response).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Register a customer and return `(token, user id)`.
    pub async fn register(state: &AppState, name: &str, email: &str) -> (String, String) {
        let (status, body) = call(
            state,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Register a user, promote it to admin in the store and return a fresh token.
    pub async fn admin(state: &AppState) -> String {
        let (_, id) = register(state, "Admin", "admin@mealease.test").await;
        let mut user: User = state.store.find(&id).await.unwrap().unwrap();
        user.role = Role::Admin;
        state.store.replace(&user).await.unwrap();
        state.tokens.issue(&user.token_user()).unwrap()
    }

    /// Create a restaurant as admin and return its id.
    pub async fn restaurant(state: &AppState, admin_token: &str, name: &str) -> String {
        let (status, body) = call(
            state,
            Method::POST,
            "/api/restaurants",
            Some(admin_token),
            Some(json!({ "name": name, "address": "1 Main St" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["_id"].as_str().unwrap().to_string()
    }
}
