// Application state module
// Shared by every connection task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;
use crate::auth::TokenService;
use crate::store::Store;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub tokens: TokenService,
    pub shutdown: Arc<Notify>,

    // Wakes every open connection so idle keep-alive ones close
    pub close_connections: Notify,

    // Set once shutdown starts; readiness reports unavailable from then on
    pub draining: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Self {
        let tokens = TokenService::new(&config.auth);
        Self {
            config,
            store,
            tokens,
            shutdown: Arc::new(Notify::new()),
            close_connections: Notify::new(),
            draining: AtomicBool::new(false),
        }
    }

    /// State backed by an empty in-memory store.
    #[cfg(test)]
    pub fn for_tests() -> Arc<Self> {
        Arc::new(Self::new(Config::for_tests(), Store::Memory(crate::store::MemoryStore::new())))
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Relaxed)
    }

    pub fn begin_shutdown(&self) {
        self.draining.store(true, Ordering::SeqCst);
        // The accept loop is the only waiter; a stored permit covers an early signal
        self.shutdown.notify_one();
        self.close_connections.notify_waiters();
    }
}
