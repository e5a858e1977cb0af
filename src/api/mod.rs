/// API routes and handlers
pub mod contact;
pub mod health;
pub mod middleware;
pub mod sections;
pub mod sessions;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(sessions::routes())
        .merge(sections::routes())
        .merge(contact::routes())
}
