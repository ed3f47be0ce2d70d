//! Wire DTOs for the subscribe endpoint.
//!
//! Kept separate from `webpush_types::Subscription` because the wire shape
//! (nested `subscription` object, optional `id`) differs from the stored
//! shape — cloudillo draws the same line between its `dto` modules and
//! its adapter-level types.

use serde::Deserialize;
use webpush_types::Keys;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
	pub client_id: String,
	#[serde(default)]
	pub id: Option<String>,
	pub subscription: SubscriptionInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInput {
	pub endpoint: String,
	#[serde(default)]
	pub expiration_time: Option<i64>,
	pub keys: Keys,
}

// vim: ts=4
