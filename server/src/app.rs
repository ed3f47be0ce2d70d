//! App state type.
//!
//! A scaled-down version of cloudillo's `AppState`/`App = Arc<AppState>`
//! pattern (`server/src/core/app.rs`): a handful of shared collaborators
//! instead of a dozen adapter trait objects, since this service has exactly
//! one persistence concern and one outbound transport.

use std::sync::Arc;

use webpush_core::PushRequester;
use webpush_types::{ClResult, Error, SubscriptionRepository};

use crate::config::Config;

pub struct AppState {
	pub config: Config,
	pub repo: Arc<dyn SubscriptionRepository>,
	pub requester: Arc<PushRequester>,
}

pub type App = Arc<AppState>;

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState").finish_non_exhaustive()
	}
}

impl AppState {
	pub async fn new(config: Config) -> ClResult<App> {
		let repo =
			webpush_postgres::SubscriptionRepositoryPostgres::new(&config.postgres_connection_string).await?;
		let requester =
			PushRequester::new().map_err(|err| Error::Internal(format!("HTTP client init: {err}")))?;

		Ok(Arc::new(Self { config, repo: Arc::new(repo), requester: Arc::new(requester) }))
	}
}

// vim: ts=4
