use std::sync::Arc;

use kittenbot::handler::MessageHandler;
use kittenbot::slack::verify::SignatureVerifier;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub handler: MessageHandler,
    /// `None` only when signature verification was explicitly disabled
    pub verifier: Option<Arc<SignatureVerifier>>,
    /// Await the handler before acknowledging a delivery
    pub process_before_response: bool,
}
