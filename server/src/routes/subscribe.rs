//! `POST /api/v1/subscribe`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use webpush_core::validate::{validate_str, Rule};
use webpush_types::NewSubscription;

use crate::auth::BasicAuth;
use crate::dto::SubscribeRequest;
use crate::prelude::*;

pub async fn subscribe(
	State(app): State<App>,
	auth: BasicAuth,
	body: Bytes,
) -> Result<StatusCode, Error> {
	let request: SubscribeRequest = serde_json::from_slice(&body)?;

	auth.require_client_id(&request.client_id)?;
	validate_str("clientId", &request.client_id, &[Rule::Required])?;
	validate_str("subscription.endpoint", &request.subscription.endpoint, &[Rule::Required, Rule::HttpUrl])?;
	validate_str("subscription.keys.p256dh", &request.subscription.keys.p256dh, &[Rule::Required, Rule::Len(87)])?;
	validate_str("subscription.keys.auth", &request.subscription.keys.auth, &[Rule::Required, Rule::Len(22)])?;

	let recipient_id = request.id.unwrap_or_else(webpush_types::subscription::synthesize_recipient_id);
	validate_str("id", &recipient_id, &[Rule::Required])?;

	let new_subscription = NewSubscription {
		endpoint: request.subscription.endpoint,
		client_id: request.client_id,
		recipient_id,
		expiration_time: request.subscription.expiration_time,
		keys: request.subscription.keys,
	};

	app.repo.save(&new_subscription).await?;

	Ok(StatusCode::CREATED)
}

// vim: ts=4
