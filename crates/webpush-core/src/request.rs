//! Push-service HTTP delivery.
//!
//! Grounded on `cloudillo-push/src/send.rs::send_push_request`: the same
//! `hyper` + `hyper-rustls` HTTP/2-only client construction and the same
//! combined `Authorization: vapid t=…,k=…` header. This module only talks
//! HTTP; VAPID signing happens in [`crate::vapid`] and is handed in as an
//! already-built `(jwt, public_key)` pair so a single [`PushRequester`] can
//! be reused across many sends with different per-endpoint tokens.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

pub const MAX_ENCRYPTED_BODY_LEN: usize = 4096;
const MAX_TTL: i64 = 2_147_483_648; // 2^31

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
	#[error("invalid request: {0}")]
	Validation(String),
	#[error("internal request failure: {0}")]
	Internal(String),
}

#[derive(Debug, Clone, Default)]
pub struct PushParams {
	pub ttl: i64,
	pub topic: Option<String>,
	pub urgency: Option<String>,
}

const ALLOWED_URGENCY: &[&str] = &["very-low", "low", "normal", "high"];

/// Clamps `ttl` into `[0, 2^31]`; negative or overflowing values clamp to
/// the maximum, per RFC 8030 §5.2.
pub fn clamp_ttl(ttl: i64) -> i64 {
	if ttl < 0 || ttl > MAX_TTL {
		MAX_TTL
	} else {
		ttl
	}
}

/// The origin (`scheme://host[:port]`, no path) that VAPID signatures for
/// `endpoint` must be bound to.
pub fn origin_of(endpoint: &str) -> Result<String, RequestError> {
	let url = url::Url::parse(endpoint)
		.map_err(|_| RequestError::Validation("endpoint is not a valid URL".into()))?;
	if url.scheme() != "http" && url.scheme() != "https" {
		return Err(RequestError::Validation("endpoint must be an http(s) URL".into()));
	}
	let host = url.host_str().ok_or_else(|| RequestError::Validation("endpoint has no host".into()))?;
	Ok(match url.port() {
		Some(port) => format!("{}://{host}:{port}", url.scheme()),
		None => format!("{}://{host}", url.scheme()),
	})
}

#[derive(Debug, Clone)]
pub struct PushOutcome {
	pub status: u16,
	pub retry_after: Option<String>,
}

pub struct PushRequester {
	client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl PushRequester {
	pub fn new() -> Result<Self, RequestError> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| RequestError::Internal(format!("TLS roots: {e}")))?
			.https_only()
			.enable_http2()
			.build();
		let client = Client::builder(TokioExecutor::new()).http2_only(true).build(connector);
		Ok(Self { client })
	}

	pub async fn send(
		&self,
		endpoint: &str,
		body: &[u8],
		params: &PushParams,
		jwt: &str,
		vapid_public_key_b64: &str,
	) -> Result<PushOutcome, RequestError> {
		origin_of(endpoint)?;
		if let Some(urgency) = params.urgency.as_deref() {
			if !ALLOWED_URGENCY.contains(&urgency) {
				return Err(RequestError::Validation(format!("unsupported urgency: {urgency}")));
			}
		}
		if body.len() > MAX_ENCRYPTED_BODY_LEN {
			return Err(RequestError::Validation("encrypted payload too large".into()));
		}

		let ttl = clamp_ttl(params.ttl);
		let mut builder = hyper::Request::builder()
			.method(hyper::Method::POST)
			.uri(endpoint)
			.header("Content-Encoding", "aes128gcm")
			.header("TTL", ttl.to_string())
			.header("Authorization", format!("vapid t={jwt}, k={vapid_public_key_b64}"));
		if let Some(topic) = params.topic.as_deref().filter(|t| !t.is_empty()) {
			builder = builder.header("Topic", topic);
		}
		if let Some(urgency) = params.urgency.as_deref().filter(|u| !u.is_empty()) {
			builder = builder.header("Urgency", urgency);
		}

		let request = builder
			.body(Full::new(Bytes::copy_from_slice(body)))
			.map_err(|e| RequestError::Internal(format!("request build error: {e}")))?;

		let response = self
			.client
			.request(request)
			.await
			.map_err(|e| RequestError::Internal(format!("connection failure: {e}")))?;

		let status = response.status().as_u16();
		let retry_after = response
			.headers()
			.get(hyper::header::RETRY_AFTER)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);
		// Body isn't otherwise needed; draining avoids leaving the
		// connection in a state hyper's pool can't reuse.
		let _ = response.into_body().collect().await;

		Ok(PushOutcome { status, retry_after })
	}
}

impl std::fmt::Debug for PushRequester {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PushRequester").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamp_ttl_clamps_negative_to_max() {
		assert_eq!(clamp_ttl(-1), MAX_TTL);
	}

	#[test]
	fn clamp_ttl_clamps_overflow_to_max() {
		assert_eq!(clamp_ttl(MAX_TTL + 1), MAX_TTL);
	}

	#[test]
	fn clamp_ttl_passes_through_in_range() {
		assert_eq!(clamp_ttl(86_400), 86_400);
	}

	#[test]
	fn origin_of_strips_path() {
		let origin = origin_of("https://push.example.com:8443/abc/def").expect("origin");
		assert_eq!(origin, "https://push.example.com:8443");
	}

	#[test]
	fn origin_of_rejects_non_http_scheme() {
		assert!(origin_of("ftp://push.example.com/abc").is_err());
	}
}
