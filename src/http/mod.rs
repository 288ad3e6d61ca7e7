//! HTTP protocol layer module
//!
//! Request buffering, response builders and content types, kept apart from
//! the resource handlers in `api`.

pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::{collect, ApiRequest, BodyError};
pub use response::{
    apply_common_headers, build_404_response, build_bytes_response, build_empty_response,
    build_json_response, build_message_response, build_options_response, HttpResponse,
};
