// Root message and probe endpoints

use hyper::StatusCode;
use serde_json::json;

use super::{ok_json, ApiResult};
use crate::config::AppState;
use crate::http::{build_json_response, HttpResponse};
use crate::logger;

pub fn root() -> ApiResult<HttpResponse> {
    ok_json(&json!({ "message": "Food Ordering API is running." }))
}

/// Liveness: the process is serving requests.
pub fn liveness() -> ApiResult<HttpResponse> {
    ok_json(&json!({ "status": "ok" }))
}

/// Readiness: the store answers and shutdown has not started.
pub async fn readiness(state: &AppState) -> ApiResult<HttpResponse> {
    let backend = state.store.backend_name();
    if state.is_draining() {
        return Ok(unavailable(backend, "shutting down"));
    }
    match state.store.ping().await {
        Ok(()) => ok_json(&json!({ "status": "ready", "backend": backend })),
        Err(e) => {
            logger::log_warning(&format!("Readiness check failed: {e}"));
            Ok(unavailable(backend, "store unavailable"))
        }
    }
}

fn unavailable(backend: &str, reason: &str) -> HttpResponse {
    build_json_response(
        StatusCode::SERVICE_UNAVAILABLE,
        &json!({ "status": "unavailable", "backend": backend, "reason": reason }),
    )
}

#[cfg(test)]
mod tests {
    use super::super::testing::{call, state};
    use hyper::{Method, StatusCode};

    #[tokio::test]
    async fn test_liveness() {
        let state = state();
        let (status, body) = call(&state, Method::GET, "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_readiness_follows_shutdown() {
        let state = state();
        let (status, body) = call(&state, Method::GET, "/readyz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "memory");

        state.begin_shutdown();
        let (status, body) = call(&state, Method::GET, "/readyz", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }
}
