use axum::{routing::get, Router};

pub const BANNER: &str = "Slack AI Assistant is running... 🚀";

async fn index() -> &'static str {
    BANNER
}

pub fn routes() -> Router {
    Router::new().route("/", get(index))
}
