mod app;
mod middleware;
mod state;

pub use app::{create_app, MAX_BODY_BYTES};
pub use middleware::{api_key_auth, evolution_api_key_auth};
pub use state::AppState;
