//! Subscription and key data model.
//!
//! Mirrors the schema described by the Go original's `webpush/subscription.go`
//! and `webpush/types.go`: a subscription is identified by its push-service
//! `endpoint`, carries a `client_id`/`recipient_id` pair, an optional
//! expiration, and exactly one `Keys` child record.

use serde::{Deserialize, Serialize};

/// Raw, decoded P-256 public key length (uncompressed point: 0x04 ‖ X ‖ Y).
pub const P256DH_RAW_LEN: usize = 65;
/// Raw, decoded shared-auth-secret length.
pub const AUTH_RAW_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keys {
	/// base64url (no padding) of 65 raw bytes — an uncompressed P-256 point.
	pub p256dh: String,
	/// base64url (no padding) of 16 raw bytes.
	pub auth: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
	pub endpoint: String,
	pub client_id: String,
	pub recipient_id: String,
	/// Milliseconds since the Unix epoch. `None` means "never expires".
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expiration_time: Option<i64>,
	pub keys: Keys,
}

impl Subscription {
	/// True iff the subscription should be considered live at `now_ms`.
	pub fn is_live(&self, now_ms: i64) -> bool {
		self.expiration_time.is_none_or(|exp| exp > now_ms)
	}
}

/// Input DTO for `SubscriptionRepository::save`. `recipient_id` is
/// synthesized by the caller (`anonymous_<ulid>`) before reaching the
/// repository if the client omitted one — the repository layer never
/// invents identifiers itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
	pub endpoint: String,
	pub client_id: String,
	pub recipient_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expiration_time: Option<i64>,
	pub keys: Keys,
}

/// Returns a synthesized recipient id for anonymous subscribers, following
/// the `anonymous_<ulid>` convention.
pub fn synthesize_recipient_id() -> String {
	format!("anonymous_{}", ulid::Ulid::new())
}
