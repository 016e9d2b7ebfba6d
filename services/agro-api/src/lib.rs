pub mod app;
pub mod config;
pub mod error;
pub mod loader;
pub mod routes_chat;
pub mod routes_info;
pub mod state;
pub mod types;

pub use app::build_router;
pub use config::AppConfig;
pub use error::ChatError;
pub use loader::{load_model, try_load, LoadError};
pub use state::{AppState, ModelState, SharedState};
