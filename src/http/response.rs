//! HTTP response building module
//!
//! Builders for the JSON and binary responses the API returns, plus the
//! headers added to every response (`Server`, CORS).

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;

use super::mime;
use crate::config::HttpConfig;

pub type HttpResponse = Response<Full<Bytes>>;

pub const ALLOWED_METHODS: &str = "GET, HEAD, PUT, PATCH, POST, DELETE";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Build a JSON response from any serializable value
pub fn build_json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> HttpResponse {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_message_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error.");
        }
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, mime::JSON)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build `{"message": "..."}`
pub fn build_message_response(status: StatusCode, message: &str) -> HttpResponse {
    build_json_response(status, &json!({ "message": message }))
}

/// Build a raw binary response (stored images)
pub fn build_bytes_response(data: Bytes, content_type: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header("Cache-Control", "public, max-age=86400")
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a response with no body
pub fn build_empty_response(status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> HttpResponse {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS)
        .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
        .header("Access-Control-Allow-Headers", ALLOWED_HEADERS)
        .header("Access-Control-Max-Age", "86400")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NO_CONTENT, &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response for unknown routes
pub fn build_404_response() -> HttpResponse {
    build_message_response(StatusCode::NOT_FOUND, "Not found.")
}

/// Add the `Server` header and, when enabled, the CORS origin header.
pub fn apply_common_headers(response: &mut HttpResponse, config: &HttpConfig) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&config.server_name) {
        headers.insert(SERVER, value);
    }
    if config.enable_cors {
        if let Ok(value) = HeaderValue::from_str(&config.cors_allow_origin) {
            headers.insert("Access-Control-Allow-Origin", value);
        }
    } else {
        headers.remove("Access-Control-Allow-Methods");
        headers.remove("Access-Control-Allow-Headers");
        headers.remove("Access-Control-Max-Age");
    }
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
