// User administration endpoints (admin only)

use serde_json::json;

use super::{ok_json, parse_body, require_admin, ApiError, ApiResult};
use crate::config::AppState;
use crate::http::{ApiRequest, HttpResponse};
use crate::model::{User, UserPatch, UserView};
use crate::store::Filter;

const NOT_FOUND: &str = "User not found.";

pub async fn list(req: &ApiRequest, state: &AppState) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let users = state.store.find_many::<User>(Filter::All).await?;
    let views: Vec<UserView> = users.iter().map(User::view).collect();
    ok_json(&views)
}

pub async fn get(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let user = state
        .store
        .find::<User>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    ok_json(&user.view())
}

/// A taken email comes back from the store as a duplicate and maps to 400.
pub async fn update(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    let patch: UserPatch = parse_body(req)?;
    let mut user = state
        .store
        .find::<User>(id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    patch.apply(&mut user).map_err(ApiError::BadRequest)?;
    if !state.store.replace(&user).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&user.view())
}

pub async fn delete(req: &ApiRequest, state: &AppState, id: &str) -> ApiResult<HttpResponse> {
    require_admin(req, state)?;
    if !state.store.delete::<User>(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    ok_json(&json!({ "message": "User deleted." }))
}
