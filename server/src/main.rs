//! Process entry point — mirrors `cloudillo-basic-server`'s thin
//! `main.rs` that just loads config and calls into the library crate.

use webpush_server::Config;

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().unwrap_or_else(|err| {
		eprintln!("configuration error: {err}");
		std::process::exit(1);
	});

	if let Err(err) = webpush_server::run(config).await {
		eprintln!("fatal: {err}");
		std::process::exit(1);
	}
}

// vim: ts=4
