//! Access log format module
//!
//! Supported formats:
//! - `dev` (short colorless line: method, path, status, time, size)
//! - `combined` (Apache/Nginx combined format)
//! - `json` (one JSON object per request)

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

/// Access log entry containing all request/response information
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    /// Client address
    pub remote_addr: String,
    /// Request timestamp
    pub time: DateTime<Local>,
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request URI path
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// Response status code
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Authenticated user id, when the request carried a valid token
    pub user: Option<String>,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create a new access log entry with current timestamp
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            status: 200,
            body_bytes: 0,
            user_agent: None,
            user: None,
            request_time_us: 0,
        }
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.request_time_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    /// Format the log entry; unknown formats fall back to `dev`
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "json" => self.format_json(),
            _ => self.format_dev(),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// `GET /api/restaurants 200 1.234 ms - 512`
    fn format_dev(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let millis = self.request_time_us as f64 / 1000.0;
        format!(
            "{} {} {} {millis:.3} ms - {}",
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes
        )
    }

    /// `$remote_addr - $user [$time_local] "$request" $status $body_bytes_sent "-" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} - {} [{}] \"{} {} HTTP/1.1\" {} {} \"-\" \"{}\"",
            self.remote_addr,
            self.user.as_deref().unwrap_or("-"),
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes,
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.format_dev())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1:51000".to_string(),
            "POST".to_string(),
            "/api/orders".to_string(),
        );
        entry.query = Some("page=1".to_string());
        entry.status = 201;
        entry.body_bytes = 345;
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.user = Some("65f0c0ffee0000000000abcd".to_string());
        entry.set_elapsed(Duration::from_micros(1500));
        entry
    }

    #[test]
    fn test_format_dev() {
        let log = create_test_entry().format("dev");
        assert_eq!(log, "POST /api/orders?page=1 201 1.500 ms - 345");
    }

    #[test]
    fn test_unknown_format_falls_back_to_dev() {
        let entry = create_test_entry();
        assert_eq!(entry.format("tiny"), entry.format("dev"));
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.starts_with("192.168.1.1:51000 - 65f0c0ffee0000000000abcd ["));
        assert!(log.contains("\"POST /api/orders?page=1 HTTP/1.1\" 201 345"));
        assert!(log.ends_with("\"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 201);
        assert_eq!(value["body_bytes"], 345);
        assert_eq!(value["request_time_us"], 1500);
        assert_eq!(value["user"], "65f0c0ffee0000000000abcd");
    }
}
