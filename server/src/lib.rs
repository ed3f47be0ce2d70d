//! HTTP collaborator layer: translates inbound requests into
//! `webpush-core` calls and builds the JSON:API-style error envelope.
//!
//! Mirrors cloudillo's lib/bin split (`cloudillo` + `basic-server`): this
//! crate exposes [`run`] and the building blocks behind it, while
//! `src/main.rs` is a thin process entry point.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod auth;
pub mod config;
pub mod dto;
pub mod prelude;
pub mod routes;

use tracing_subscriber::EnvFilter;

pub use app::{App, AppState};
pub use config::Config;
use prelude::*;

/// Initialises logging, builds shared state from `config`, binds, and
/// serves until a Ctrl-C or SIGTERM is received.
pub async fn run(config: Config) -> ClResult<()> {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let listen_addr = config.listen_addr.clone();
	let app = AppState::new(config).await?;
	let router = routes::router().with_state(app);

	let listener = tokio::net::TcpListener::bind(&listen_addr)
		.await
		.map_err(|err| Error::Internal(format!("failed to bind {listen_addr}: {err}")))?;
	info!("listening on {listen_addr}");

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(|err| Error::Internal(format!("server error: {err}")))
}

/// Mirrors cloudillo's graceful-shutdown wiring in `core/webserver.rs`:
/// Ctrl-C or SIGTERM both trigger a clean stop.
async fn shutdown_signal() {
	let ctrl_c = async {
		let _ = tokio::signal::ctrl_c().await;
	};

	#[cfg(unix)]
	let terminate = async {
		let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
			return;
		};
		signal.recv().await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}
}

// vim: ts=4
