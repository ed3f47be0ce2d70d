//! Basic-auth extractor.
//!
//! A custom `FromRequestParts` impl rather than `axum-extra`'s typed
//! header, grounded on `cloudillo-core::extract::Auth` (manual header
//! inspection, crate-local rejection type) so the 401-vs-403 distinction
//! and the `WWW-Authenticate` header on 401 are under our control.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use webpush_types::{Error, ErrorResponse};

use crate::app::App;

/// Username = the tenant's `client_id`; password = the single shared
/// secret from [`crate::config::Config::basic_auth_password`].
#[derive(Debug, Clone)]
pub struct BasicAuth {
	pub client_id: String,
}

/// Wraps [`Error`] so the 401 case can carry `WWW-Authenticate` without
/// teaching the shared `webpush-types` crate about that HTTP-specific header.
pub struct AuthRejection(Error);

impl IntoResponse for AuthRejection {
	fn into_response(self) -> Response {
		let is_missing = matches!(self.0, Error::AuthMissing);
		let mut response = ErrorResponse::from(self.0).into_response();
		if is_missing {
			response
				.headers_mut()
				.insert("WWW-Authenticate", HeaderValue::from_static("Basic realm=\"webpush\""));
		}
		response
	}
}

// `App: FromRef<S>` is satisfied via axum's blanket `impl<T: Clone> FromRef<T>
// for T` whenever the router's state type is `App` itself — ordinary axum
// state plumbing, not something specific to cloudillo's extractor.
impl<S> FromRequestParts<S> for BasicAuth
where
	App: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = AuthRejection;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let app = App::from_ref(state);

		let header = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.ok_or(AuthRejection(Error::AuthMissing))?;

		let encoded = header.strip_prefix("Basic ").ok_or(AuthRejection(Error::AuthMissing))?;
		let decoded = STANDARD.decode(encoded).map_err(|_| AuthRejection(Error::AuthMissing))?;
		let decoded = String::from_utf8(decoded).map_err(|_| AuthRejection(Error::AuthMissing))?;
		let (client_id, password) =
			decoded.split_once(':').ok_or(AuthRejection(Error::AuthMissing))?;

		if client_id.is_empty() {
			return Err(AuthRejection(Error::AuthMissing));
		}
		if password != app.config.basic_auth_password {
			return Err(AuthRejection(Error::AuthRejected));
		}

		Ok(BasicAuth { client_id: client_id.to_string() })
	}
}

impl BasicAuth {
	/// 403s if `other` (a path/body-supplied client id) disagrees with the
	/// authenticated one.
	pub fn require_client_id(&self, other: &str) -> Result<(), Error> {
		if self.client_id == other {
			Ok(())
		} else {
			Err(Error::AuthRejected)
		}
	}
}

// vim: ts=4
