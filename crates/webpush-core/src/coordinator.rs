//! Fan-out delivery coordinator.
//!
//! Per-subscription work (encrypt, sign, send) runs concurrently via a
//! `tokio::task::JoinSet`, grounded in cloudillo's use of spawned worker
//! tasks elsewhere in the workspace. Aggregation is **collect-first,
//! reap-after**: every outcome is gathered before any `delete_by_endpoint`
//! call, which is a deliberate departure from the Go original's
//! early-return-on-error behavior (see `DESIGN.md`).
//!
//! VAPID config resolution is lazy: [`deliver`] takes it as a closure and
//! only calls it after confirming there is at least one subscription to
//! sign for, so an empty subscription set never touches the environment.

use std::sync::Arc;

use tokio::task::JoinSet;
use webpush_types::{ErrorObject, Subscription, SubscriptionRepository};

use crate::crypto::encrypt::{ContentEncryptor, MAX_PLAINTEXT_LEN};
use crate::prelude::*;
use crate::request::{origin_of, PushParams, PushRequester};
use crate::vapid::signer::{VapidConfig, VapidError, VapidSigner};

#[derive(Debug, Clone)]
pub enum Selector {
	Client { client_id: String },
	ClientAndRecipient { client_id: String, recipient_id: String },
}

#[derive(Debug, Clone)]
pub struct DeliverOutcome {
	pub status: u16,
	pub errors: Vec<ErrorObject>,
}

impl DeliverOutcome {
	fn single(status: u16, error: ErrorObject) -> Self {
		Self { status, errors: vec![error] }
	}
}

/// Classifies one subscription's delivery attempt into either success
/// (`None`) or a per-endpoint [`ErrorObject`], per the status table in
/// `deliver`'s module docs.
fn classify(endpoint: &str, status: u16, retry_after: Option<String>) -> Option<ErrorObject> {
	match status {
		200 | 201 | 204 => None,
		400 => Some(ErrorObject::new(400, "bad request").with_endpoint(endpoint)),
		404 => Some(ErrorObject::new(404, "subscription not found").with_endpoint(endpoint)),
		410 => Some(ErrorObject::new(410, "subscription expired").with_endpoint(endpoint)),
		429 => Some(
			ErrorObject::new(429, "too many requests")
				.with_detail(format!("Retry after {}", retry_after.unwrap_or_default()))
				.with_endpoint(endpoint),
		),
		_ => Some(ErrorObject::internal(format!("upstream returned {status}")).with_endpoint(endpoint)),
	}
}

/// 500 dominates; otherwise the first error (in subscription order)
/// determines the aggregate status; no errors means success.
fn aggregate_status(errors: &[ErrorObject]) -> u16 {
	if errors.is_empty() {
		return 201;
	}
	if errors.iter().any(|e| e.status == 500) {
		return 500;
	}
	errors[0].status
}

/// `vapid_config` is a closure rather than an already-resolved value so
/// that environment reads (parsing the PEM key, re-checking subject/expiry
/// fallbacks) only happen once there is at least one live subscription to
/// sign for — an empty or all-filtered subscription set never touches the
/// environment at all.
pub async fn deliver(
	repo: &Arc<dyn SubscriptionRepository>,
	requester: &Arc<PushRequester>,
	vapid_config: impl FnOnce() -> Result<VapidConfig, VapidError>,
	selector: Selector,
	payload: &[u8],
	params: &PushParams,
) -> DeliverOutcome {
	if payload.len() > MAX_PLAINTEXT_LEN {
		return DeliverOutcome::single(413, ErrorObject::new(413, "payload too large"));
	}

	let subscriptions = match fetch_subscriptions(repo, &selector).await {
		Ok(subs) => subs,
		Err(err) => return DeliverOutcome::single(500, err.into_error_object()),
	};

	if subscriptions.is_empty() {
		return DeliverOutcome::single(404, ErrorObject::new(404, "no subscriptions found"));
	}

	let vapid_config = match vapid_config() {
		Ok(cfg) => cfg,
		Err(err) => return DeliverOutcome::single(500, ErrorObject::internal(err.to_string())),
	};

	let mut tasks = JoinSet::new();
	for subscription in subscriptions {
		let requester = Arc::clone(requester);
		let vapid_config = vapid_config.clone();
		let payload = payload.to_vec();
		let params = params.clone();
		tasks.spawn(async move { deliver_one(&requester, &vapid_config, &subscription, &payload, &params).await });
	}

	let mut errors = Vec::new();
	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok(Some(error)) => errors.push(error),
			Ok(None) => {}
			Err(join_err) => {
				warn!("push delivery task panicked or was cancelled: {join_err}");
				errors.push(ErrorObject::internal("delivery task did not complete"));
			}
		}
	}

	let status = aggregate_status(&errors);
	reap(repo, &errors).await;

	DeliverOutcome { status, errors }
}

async fn fetch_subscriptions(
	repo: &Arc<dyn SubscriptionRepository>,
	selector: &Selector,
) -> ClResult<Vec<Subscription>> {
	match selector {
		Selector::Client { client_id } => repo.get_by_client(client_id).await,
		Selector::ClientAndRecipient { client_id, recipient_id } => {
			repo.get_by_client_and_recipient(client_id, recipient_id).await
		}
	}
}

/// Encrypts, signs, and sends to a single subscription. Returns `None` on
/// success or `Some(error)` describing the failure.
async fn deliver_one(
	requester: &PushRequester,
	vapid_config: &VapidConfig,
	subscription: &Subscription,
	payload: &[u8],
	params: &PushParams,
) -> Option<ErrorObject> {
	let endpoint = subscription.endpoint.as_str();

	let encryptor = match ContentEncryptor::new(&subscription.keys) {
		Ok(enc) => enc,
		Err(err) => return Some(ErrorObject::internal(err.to_string()).with_endpoint(endpoint)),
	};
	let body = match encryptor.encrypt(payload) {
		Ok(body) => body,
		Err(err) => return Some(ErrorObject::internal(err.to_string()).with_endpoint(endpoint)),
	};

	let audience = match origin_of(endpoint) {
		Ok(aud) => aud,
		Err(err) => return Some(ErrorObject::internal(err.to_string()).with_endpoint(endpoint)),
	};
	let (jwt, public_key) = match VapidSigner.sign(vapid_config, &audience) {
		Ok(pair) => pair,
		Err(err) => return Some(ErrorObject::internal(err.to_string()).with_endpoint(endpoint)),
	};

	match requester.send(endpoint, &body, params, &jwt, &public_key).await {
		Ok(outcome) => classify(endpoint, outcome.status, outcome.retry_after),
		Err(err) => Some(ErrorObject::internal(err.to_string()).with_endpoint(endpoint)),
	}
}

/// Deletes every endpoint whose error was 404/410. Runs after the full
/// aggregate is known, regardless of the aggregate status.
async fn reap(repo: &Arc<dyn SubscriptionRepository>, errors: &[ErrorObject]) {
	for error in errors {
		if !matches!(error.status, 404 | 410) {
			continue;
		}
		let Some(endpoint) = error.endpoint() else { continue };
		if let Err(err) = repo.delete_by_endpoint(endpoint).await {
			warn!("failed to reap stale subscription {endpoint}: {err}");
		}
	}
}
