// Export route modules
pub mod events;
pub mod health;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(events::routes(state))
        .merge(health::routes())
}
