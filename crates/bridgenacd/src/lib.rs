//! Bridge NAC daemon library: portal control API and shared state.

pub mod api;
pub mod state;

pub use api::router;
pub use state::AppState;
