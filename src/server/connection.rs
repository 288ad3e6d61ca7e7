// Connection handling module
// Serves one TCP connection per task and turns each request into an API call

use hyper::body::Body;
use hyper::header::{HeaderValue, CONNECTION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::{self, ApiError};
use crate::config::AppState;
use crate::http::{apply_common_headers, collect, BodyError, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Accept and process a connection, checking limits and logging.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve a connection in a spawned task, bounded by the connection deadline.
///
/// The deadline is the larger of the read and write timeouts. Once shutdown
/// starts the connection finishes its in-flight request and closes. The
/// connection counter is decremented when the task ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout_duration =
            Duration::from_secs(std::cmp::max(performance.read_timeout, performance.write_timeout));

        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move { Ok::<_, Infallible>(serve_request(req, &state, peer_addr).await) }
            }),
        );

        // Registered before the draining check so a shutdown in between is not missed
        let served = async {
            tokio::pin!(conn);
            let closing = state.close_connections.notified();
            tokio::pin!(closing);
            closing.as_mut().enable();

            if !state.is_draining() {
                tokio::select! {
                    result = conn.as_mut() => return result,
                    () = closing => {}
                }
            }
            conn.as_mut().graceful_shutdown();
            conn.await
        };

        match tokio::time::timeout(timeout_duration, served).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Buffer, route and decorate a single request, then write its access log line.
pub async fn serve_request<B>(req: Request<B>, state: &AppState, peer_addr: SocketAddr) -> HttpResponse
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let start = Instant::now();
    let logging = &state.config.logging;
    let mut entry = logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(str::to_string);
        entry.user_agent = req
            .headers()
            .get(hyper::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        entry
    });

    let mut response = match collect(req, state.config.http.max_body_size).await {
        Ok(api_req) => {
            if let Some(entry) = entry.as_mut() {
                entry.user = state
                    .tokens
                    .authenticate(api_req.authorization())
                    .ok()
                    .map(|identity| identity.id);
            }
            api::route(&api_req, state).await
        }
        Err(err) => {
            if let BodyError::Read(cause) = &err {
                logger::log_warning(&format!("Failed to read request from {peer_addr}: {cause}"));
            }
            ApiError::from(err).into_response()
        }
    };

    apply_common_headers(&mut response, &state.config.http);
    if state.is_draining() {
        // Keep-alive clients reconnect elsewhere instead of reusing this connection
        response
            .headers_mut()
            .insert(CONNECTION, HeaderValue::from_static("close"));
    }

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.set_elapsed(start.elapsed());
        logger::log_access(&entry, &logging.access_log_format);
    }

    response
}
