//! Generates a fresh VAPID keypair and prints it. No flags, no interaction —
//! a collaborator utility, not a service: see `cloudillo`'s `basic-server`
//! for the equivalent minimal binary.

#![forbid(unsafe_code)]

use webpush_core::VapidKey;

fn main() {
	let key = VapidKey::generate();

	let pem = match key.to_pem(true) {
		Ok(pem) => pem,
		Err(err) => {
			eprintln!("failed to encode VAPID private key: {err}");
			std::process::exit(1);
		}
	};

	print!("{pem}");
	println!("{}", key.public_url_b64());
}

// vim: ts=4
