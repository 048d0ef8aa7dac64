/// Axum webserver: application state, server lifecycle and API routes
pub mod routes;
pub mod server;
pub mod state;
pub mod utils;

pub use server::{shutdown, start_server};
pub use state::AppState;
