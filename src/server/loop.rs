// Server loop module
// Accepts connections until shutdown is requested, then drains active ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the accept loop on `listener` until `state.begin_shutdown()` is called.
///
/// The listener is closed as soon as shutdown starts. Connections already
/// being served get up to `performance.shutdown_grace` seconds to finish.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = state.shutdown.notified() => break,
        }
    }

    drop(listener);
    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    drain_connections(&active_connections, grace).await;
    Ok(())
}

/// Wait until no connection is active or `grace` has elapsed.
/// Returns the number of connections still open.
async fn drain_connections(active: &AtomicUsize, grace: Duration) -> usize {
    logger::log_shutdown_started(active.load(Ordering::SeqCst));

    let deadline = tokio::time::Instant::now() + grace;
    while active.load(Ordering::SeqCst) > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }

    let remaining = active.load(Ordering::SeqCst);
    logger::log_shutdown_complete(remaining);
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_drain_without_connections() {
        let active = AtomicUsize::new(0);
        assert_eq!(drain_connections(&active, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let active = AtomicUsize::new(2);
        assert_eq!(drain_connections(&active, Duration::from_millis(120)).await, 2);
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let state = AppState::for_tests();
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(start_server_loop(listener, Arc::clone(&state)));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK"), "{reply}");
        assert!(reply.contains(r#"{"status":"ok"}"#));

        state.begin_shutdown();
        server.await.unwrap().unwrap();
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive() {
        let state = AppState::for_tests();
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(start_server_loop(listener, Arc::clone(&state)));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 1024];
        let mut reply = Vec::new();
        while !String::from_utf8_lossy(&reply).contains(r#"{"status":"ok"}"#) {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early");
            reply.extend_from_slice(&buf[..n]);
        }

        // The grace period is 10s; an idle connection must not hold the drain open
        state.begin_shutdown();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("drain waited for the idle connection")
            .unwrap()
            .unwrap();
        assert_eq!(stream.read(&mut buf).await.unwrap(), 0);
    }
}
