//! Error envelope and the crate-wide `Error` type.
//!
//! The wire format is a JSON:API-style `{errors:[...]}` document (RFC 8030
//! does not mandate an error body shape; this follows the convention the
//! original Go service used). Every [`ErrorObject`] self-validates before
//! being serialized; a malformed object is replaced by a generic 500 so that
//! a bug in error construction can never leak an inconsistent response.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub type ClResult<T> = std::result::Result<T, Error>;

/// `meta` object attached to a per-endpoint delivery error.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ErrorMeta {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorObject {
	pub status: u16,
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub code: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub meta: Option<ErrorMeta>,
}

impl ErrorObject {
	pub fn new(status: u16, title: impl Into<String>) -> Self {
		Self { status, title: title.into(), code: None, detail: None, meta: None }
	}

	#[must_use]
	pub fn with_code(mut self, code: impl Into<String>) -> Self {
		self.code = Some(code.into());
		self
	}

	#[must_use]
	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}

	#[must_use]
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.meta = Some(ErrorMeta { endpoint: Some(endpoint.into()) });
		self
	}

	pub fn endpoint(&self) -> Option<&str> {
		self.meta.as_ref().and_then(|m| m.endpoint.as_deref())
	}

	/// A malformed object (out-of-range status, empty title) is never
	/// serialized as-is; callers must replace it with [`ErrorObject::internal`].
	pub fn is_valid(&self) -> bool {
		(100..=599).contains(&self.status) && !self.title.is_empty()
	}

	pub fn internal(detail: impl Into<String>) -> Self {
		Self::new(500, "internal server error").with_detail(detail)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ErrorResponse {
	pub errors: Vec<ErrorObject>,
}

impl ErrorResponse {
	pub fn single(object: ErrorObject) -> Self {
		Self { errors: vec![object] }
	}

	pub fn is_valid(&self) -> bool {
		!self.errors.is_empty() && self.errors.iter().all(ErrorObject::is_valid)
	}

	/// The aggregate HTTP status for this response: the first error's
	/// status, clamped below 200 up to 500. Empty error lists are treated
	/// as an internal bug and also clamp to 500.
	pub fn status(&self) -> StatusCode {
		let raw = self.errors.first().map_or(500, |e| e.status);
		new_response_status(raw)
	}
}

/// Clamps a status code below 200 (never a legal error status) up to 500,
/// mirroring the Go original's `NewResponseError` guard.
fn new_response_status(raw: u16) -> StatusCode {
	if raw < 200 {
		return StatusCode::INTERNAL_SERVER_ERROR;
	}
	StatusCode::from_u16(raw).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ErrorResponse {
	fn into_response(self) -> Response {
		let response = if self.is_valid() {
			self
		} else {
			tracing::warn!("error response failed self-validation, replacing with generic 500");
			Self::single(ErrorObject::internal("malformed error response"))
		};
		let status = response.status();
		let body = serde_json::to_vec(&response).unwrap_or_else(|_| b"{\"errors\":[]}".to_vec());
		let mut res = Response::new(axum::body::Body::from(body));
		*res.status_mut() = status;
		res.headers_mut().insert(
			axum::http::header::CONTENT_TYPE,
			axum::http::HeaderValue::from_static("application/vnd.api+json"),
		);
		res
	}
}

/// Internal error type used across the core and server crates. Each variant
/// maps onto a single [`ErrorObject`] via [`Error::into_error_object`].
#[derive(Debug)]
pub enum Error {
	NotFound(String),
	Validation(String),
	AuthMissing,
	AuthRejected,
	Gone(String),
	TooLarge,
	TooManyRequests(String),
	Internal(String),
}

impl Error {
	pub fn into_error_object(self) -> ErrorObject {
		match self {
			Error::NotFound(title) => ErrorObject::new(404, title),
			Error::Validation(detail) => ErrorObject::new(400, "validation failed").with_detail(detail),
			Error::AuthMissing => ErrorObject::new(401, "authentication required"),
			Error::AuthRejected => ErrorObject::new(403, "authentication rejected"),
			Error::Gone(title) => ErrorObject::new(410, title),
			Error::TooLarge => ErrorObject::new(413, "payload too large"),
			Error::TooManyRequests(detail) => {
				ErrorObject::new(429, "too many requests").with_detail(detail)
			}
			Error::Internal(detail) => {
				tracing::warn!("internal error: {detail}");
				ErrorObject::internal(detail)
			}
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{self:?}")
	}
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		ErrorResponse::single(self.into_error_object()).into_response()
	}
}

impl From<Error> for ErrorResponse {
	fn from(err: Error) -> Self {
		ErrorResponse::single(err.into_error_object())
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::warn!("json error: {err}");
		Error::Validation("malformed JSON body".into())
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		tracing::warn!("io error: {err}");
		Error::Internal(err.to_string())
	}
}
