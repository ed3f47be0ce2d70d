//! `DELETE /api/v1/unsubscribe[/{id}]`.
//!
//! Registered as two routes (plain and with a trailing recipient id) since
//! axum has no notion of an optional path segment; both delegate to
//! [`handle`].

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::auth::BasicAuth;
use crate::prelude::*;

pub async fn unsubscribe(State(app): State<App>, auth: BasicAuth) -> Result<StatusCode, Error> {
	handle(app, auth, None).await
}

pub async fn unsubscribe_recipient(
	State(app): State<App>,
	auth: BasicAuth,
	Path(recipient_id): Path<String>,
) -> Result<StatusCode, Error> {
	handle(app, auth, Some(recipient_id)).await
}

async fn handle(app: App, auth: BasicAuth, recipient_id: Option<String>) -> Result<StatusCode, Error> {
	if !app.repo.has_any_by_client(&auth.client_id).await? {
		return Err(Error::NotFound("no subscriptions for client".into()));
	}

	match recipient_id {
		Some(recipient_id) => app.repo.delete_by_client_and_recipient(&auth.client_id, &recipient_id).await?,
		None => app.repo.delete_by_client(&auth.client_id).await?,
	}

	Ok(StatusCode::NO_CONTENT)
}

// vim: ts=4
