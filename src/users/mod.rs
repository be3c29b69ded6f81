use crate::state::AppState;
use axum::Router;

pub mod directory;
mod dto;
pub mod error;
pub mod handlers;
pub mod model;
pub mod password;
pub mod services;
pub mod store;

pub use directory::UserDirectory;
pub use store::UserStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_routes())
}
