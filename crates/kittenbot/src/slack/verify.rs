//! Slack request signing (`v0` scheme).
//!
//! Slack signs each delivery with `v0=` followed by the hex HMAC-SHA256 of
//! `v0:{timestamp}:{raw body}`, keyed by the app's signing secret.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::errors::SignatureError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const MAX_REQUEST_AGE: Duration = Duration::from_secs(60 * 5);

const VERSION: &str = "v0";

fn keyed_mac(secret: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac
}

/// Compute the `X-Slack-Signature` value for a request
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mac = keyed_mac(secret, timestamp, body);
    format!("{}={}", VERSION, hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
    max_age: Duration,
}

impl SignatureVerifier {
    pub fn new(signing_secret: SecretString) -> Self {
        Self {
            signing_secret,
            max_age: MAX_REQUEST_AGE,
        }
    }

    /// Verify a delivery against the current wall clock
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.verify_at(timestamp, signature, body, now)
    }

    pub fn verify_at(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: u64,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        let sent_at: u64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if now.abs_diff(sent_at) > self.max_age.as_secs() {
            return Err(SignatureError::Stale);
        }

        let expected = signature
            .strip_prefix("v0=")
            .and_then(|hex_digest| hex::decode(hex_digest).ok())
            .ok_or(SignatureError::Mismatch)?;

        keyed_mac(self.signing_secret.expose_secret(), timestamp, body)
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}
