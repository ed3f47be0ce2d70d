//! Process-wide configuration, read once from the environment at startup.
//!
//! Grounded on cloudillo's `AppBuilder`/`AppBuilderOpts` pattern
//! (`server/src/core/app.rs`): a single struct built once, with every
//! fallback logged via `tracing::warn!` rather than failing silently.
//! Unlike `AppBuilderOpts`, the VAPID key itself is *not* baked in here —
//! [`webpush_core::VapidConfig::from_env`] re-reads it on every signature so
//! rotating `VAPID_PRIVATE_KEY` takes effect without a restart.

use webpush_types::{ClResult, Error};

const ENV_BASIC_AUTH_PASSWORD: &str = "BASIC_AUTH_PASSWORD";
const ENV_POSTGRES_CONNECTION_STRING: &str = "POSTGRES_CONNECTION_STRING";
const ENV_LISTEN_ADDR: &str = "LISTEN_ADDR";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct Config {
	/// Shared Basic-auth password; username is always the request's `client_id`.
	pub basic_auth_password: String,
	pub postgres_connection_string: String,
	pub listen_addr: String,
}

impl Config {
	pub fn from_env() -> ClResult<Self> {
		let basic_auth_password = std::env::var(ENV_BASIC_AUTH_PASSWORD)
			.map_err(|_| Error::Internal(format!("{ENV_BASIC_AUTH_PASSWORD} is not set")))?;
		let postgres_connection_string = std::env::var(ENV_POSTGRES_CONNECTION_STRING)
			.map_err(|_| Error::Internal(format!("{ENV_POSTGRES_CONNECTION_STRING} is not set")))?;
		let listen_addr = std::env::var(ENV_LISTEN_ADDR).unwrap_or_else(|_| {
			tracing::warn!("{ENV_LISTEN_ADDR} not set, defaulting to {DEFAULT_LISTEN_ADDR}");
			DEFAULT_LISTEN_ADDR.to_string()
		});

		Ok(Self { basic_auth_password, postgres_connection_string, listen_addr })
	}
}

// vim: ts=4
