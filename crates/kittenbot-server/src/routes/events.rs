use crate::state::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use kittenbot::slack::events::{
    classify, parse_event, Classification, RETRY_NUM_HEADER, RETRY_REASON_HEADER,
};
use kittenbot::slack::verify::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use serde_json::Value;
use tracing::{debug, info, warn};

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    // Signatures cover the raw body, so check before parsing anything
    if let Some(verifier) = &state.verifier {
        let timestamp = header_str(&headers, TIMESTAMP_HEADER);
        let signature = header_str(&headers, SIGNATURE_HEADER);
        if let Err(e) = verifier.verify(timestamp, signature, &body) {
            warn!("Rejected Slack delivery: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Delivery body is not valid JSON: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let event = match classify(&payload) {
        Ok(Classification::Handshake { challenge }) => {
            info!("Slack challenge verification received");
            return (StatusCode::OK, challenge).into_response();
        }
        Ok(Classification::Event(payload)) => parse_event(payload),
        Err(e) => Err(e),
    };

    let event = match event {
        Ok(event) => event,
        Err(e) => {
            warn!("Malformed Slack delivery: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // The first delivery already produced (or is producing) the replies
    if let Some(attempt) = header_str(&headers, RETRY_NUM_HEADER) {
        debug!(
            attempt,
            reason = header_str(&headers, RETRY_REASON_HEADER).unwrap_or("unknown"),
            "Acknowledging Slack redelivery without handling it"
        );
        return StatusCode::OK.into_response();
    }

    if state.process_before_response {
        let outcome = state.handler.handle(event).await;
        debug!(?outcome, "Delivery handled");
    } else {
        let handler = state.handler.clone();
        tokio::spawn(async move {
            let outcome = handler.handle(event).await;
            debug!(?outcome, "Delivery handled");
        });
    }

    StatusCode::OK.into_response()
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/slack/events", post(handler))
        .with_state(state)
}
