//! The narrow persistence contract the core depends on.
//!
//! Shaped after `cloudillo-types::auth_adapter::AuthAdapter`: an
//! `async_trait` over `Debug + Send + Sync`, returning the crate's own
//! `ClResult`. Swapping the concrete adapter (see `webpush-postgres`) never
//! requires changing the core.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ClResult;
use crate::subscription::{NewSubscription, Subscription};

#[async_trait]
pub trait SubscriptionRepository: Debug + Send + Sync {
	/// All live subscriptions (expiration `NULL` or in the future) for a client.
	async fn get_by_client(&self, client_id: &str) -> ClResult<Vec<Subscription>>;

	/// All live subscriptions for a single (client, recipient) pair.
	async fn get_by_client_and_recipient(
		&self,
		client_id: &str,
		recipient_id: &str,
	) -> ClResult<Vec<Subscription>>;

	/// Idempotent: deleting an endpoint that is not present is not an error.
	async fn delete_by_endpoint(&self, endpoint: &str) -> ClResult<()>;

	/// Upsert by `endpoint`; on conflict, updates `expiration_time`,
	/// `client_id`, `recipient_id`, and upserts the child `keys` row by
	/// `p256dh`, updating `auth` in place.
	async fn save(&self, subscription: &NewSubscription) -> ClResult<()>;

	async fn delete_by_client(&self, client_id: &str) -> ClResult<()>;

	async fn delete_by_client_and_recipient(
		&self,
		client_id: &str,
		recipient_id: &str,
	) -> ClResult<()>;

	async fn has_any_by_client(&self, client_id: &str) -> ClResult<bool>;
}
