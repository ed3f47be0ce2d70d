//! `POST /api/v1/push[/{id}]`.
//!
//! Registered as two routes (plain and with a trailing recipient id), same
//! shape as [`super::unsubscribe`]; both delegate to [`handle`].

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use webpush_core::coordinator::{deliver, Selector};
use webpush_core::request::PushParams;
use webpush_core::validate::{validate_str, Rule};
use webpush_core::VapidConfig;
use webpush_types::{ErrorObject, ErrorResponse};

use crate::auth::BasicAuth;
use crate::prelude::*;

const MAX_BODY_LEN: usize = 4096;
const ALLOWED_URGENCY: &[&str] = &["very-low", "low", "normal", "high"];

#[derive(Debug, Deserialize)]
pub struct PushQuery {
	#[serde(default)]
	pub ttl: Option<i64>,
	#[serde(default)]
	pub topic: Option<String>,
	#[serde(default)]
	pub urgency: Option<String>,
	#[serde(default)]
	pub id: Option<String>,
}

pub async fn push(
	State(app): State<App>,
	auth: BasicAuth,
	Query(query): Query<PushQuery>,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let recipient_id = query.id.clone();
	handle(app, auth, recipient_id, query, headers, body).await
}

pub async fn push_recipient(
	State(app): State<App>,
	auth: BasicAuth,
	Path(recipient_id): Path<String>,
	Query(query): Query<PushQuery>,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	handle(app, auth, Some(recipient_id), query, headers, body).await
}

async fn handle(
	app: App,
	auth: BasicAuth,
	recipient_id: Option<String>,
	query: PushQuery,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	if let Err(response) = check_media_type(&headers) {
		return response;
	}
	if body.len() > MAX_BODY_LEN {
		return Error::TooLarge.into_response();
	}
	if let Some(urgency) = query.urgency.as_deref() {
		if let Err(err) = validate_str("urgency", urgency, &[Rule::OneOf(ALLOWED_URGENCY)]) {
			return err.into_response();
		}
	}

	let selector = match recipient_id {
		Some(recipient_id) => Selector::ClientAndRecipient { client_id: auth.client_id, recipient_id },
		None => Selector::Client { client_id: auth.client_id },
	};
	let params = PushParams { ttl: query.ttl.unwrap_or(0), topic: query.topic, urgency: query.urgency };

	// `VapidConfig::from_env` is only called inside `deliver`, and only once
	// it has confirmed there is at least one live subscription to sign for.
	let outcome = deliver(&app.repo, &app.requester, VapidConfig::from_env, selector, &body, &params).await;

	if outcome.status == 201 {
		return StatusCode::CREATED.into_response();
	}
	build_error_response(outcome.status, outcome.errors)
}

/// `Content-Type` is optional; when present it must be `application/json`
/// or `text/plain` (ignoring any `; charset=...` suffix), else 415.
fn check_media_type(headers: &HeaderMap) -> Result<(), Response> {
	let Some(content_type) = headers.get(axum::http::header::CONTENT_TYPE) else {
		return Ok(());
	};
	let Ok(content_type) = content_type.to_str() else {
		return Err(build_error_response(400, vec![ErrorObject::new(400, "Content-Type header is not valid UTF-8")]));
	};
	let base = content_type.split(';').next().unwrap_or("").trim();
	if base == "application/json" || base == "text/plain" {
		Ok(())
	} else {
		let detail = format!("unsupported Content-Type: {base}");
		Err(build_error_response(415, vec![ErrorObject::new(415, "unsupported media type").with_detail(detail)]))
	}
}

fn build_error_response(status: u16, errors: Vec<ErrorObject>) -> Response {
	let mut response = ErrorResponse { errors }.into_response();
	if let Ok(code) = StatusCode::from_u16(status) {
		*response.status_mut() = code;
	}
	response
}

// vim: ts=4
