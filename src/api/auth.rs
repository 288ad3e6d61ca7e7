// Account endpoints: registration, login and the caller's own profile

use serde::Deserialize;
use serde_json::json;

use super::{authenticate, created_json, ok_json, parse_body, ApiError, ApiResult};
use crate::auth::{hash_password, verify_password};
use crate::config::AppState;
use crate::http::{ApiRequest, HttpResponse};
use crate::model::{non_empty, normalize_email, trimmed, ProfilePatch, User};

#[derive(Debug, Default, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password.";

/// New accounts are always customers; admins are promoted through `/api/users`.
pub async fn register(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let body: RegisterRequest = parse_body(req)?;
    let (Some(name), Some(email), Some(password)) =
        (trimmed(body.name), trimmed(body.email), non_empty(body.password))
    else {
        return Err(ApiError::bad_request("Name, email and password are required."));
    };

    let email = normalize_email(&email);
    if state
        .store
        .find_one_by::<User>("email", &email)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already in use."));
    }

    let hash = hash_password(&password, state.config.auth.bcrypt_cost).await?;
    let user = User::new(&name, &email, hash, body.address, body.phone);
    // A concurrent registration surfaces as a duplicate key here
    state.store.insert(&user).await?;

    let summary = user.token_user();
    let token = state.tokens.issue(&summary)?;
    created_json(&json!({
        "message": "Registration successful.",
        "token": token,
        "user": summary,
    }))
}

pub async fn login(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let body: LoginRequest = parse_body(req)?;
    let (Some(email), Some(password)) = (trimmed(body.email), non_empty(body.password)) else {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    };

    let user = state
        .store
        .find_one_by::<User>("email", &normalize_email(&email))
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID_CREDENTIALS))?;
    if !verify_password(&password, &user.password_hash).await? {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let summary = user.token_user();
    let token = state.tokens.issue(&summary)?;
    ok_json(&json!({ "token": token, "user": summary }))
}

async fn current_user(req: &ApiRequest, state: &AppState) -> ApiResult<User> {
    let identity = authenticate(req, state)?;
    state
        .store
        .find::<User>(&identity.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found."))
}

pub async fn profile(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let user = current_user(req, state).await?;
    ok_json(&user.view())
}

pub async fn update_profile(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let mut user = current_user(req, state).await?;
    let patch: ProfilePatch = parse_body(req)?;

    if let Some(password) = patch.apply(&mut user) {
        user.password_hash = hash_password(&password, state.config.auth.bcrypt_cost).await?;
    }
    if !state.store.replace(&user).await? {
        return Err(ApiError::not_found("User not found."));
    }
    ok_json(&user.view())
}

pub async fn delete_account(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    let identity = authenticate(req, state)?;
    if !state.store.delete::<User>(&identity.id).await? {
        return Err(ApiError::not_found("User not found."));
    }
    ok_json(&json!({ "message": "Account deleted." }))
}
