//! Shared handler state.

use nac_access::SessionManager;
use std::sync::Arc;

/// State handed to every API handler.
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

impl AppState {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }
}
