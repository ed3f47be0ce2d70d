//! Web Push delivery core
//!
//! Implements the cryptographic and transport pipeline that turns a
//! plaintext payload and a set of stored subscriptions into delivered push
//! messages:
//!
//! - VAPID key handling (RFC 8292) — [`vapid::key`]
//! - VAPID JWT signing — [`vapid::signer`]
//! - Message encryption (RFC 8188 aes128gcm, RFC 8291) — [`crypto`]
//! - Push-service HTTP requests — [`request`]
//! - Per-subscription fan-out and result aggregation — [`coordinator`]
//! - Declarative input validation — [`validate`]

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod coordinator;
pub mod crypto;
pub mod request;
pub mod validate;
pub mod vapid;

mod prelude;

pub use coordinator::{deliver, DeliverOutcome, Selector};
pub use crypto::encrypt::{ContentEncryptor, EncryptError};
pub use request::{PushOutcome, PushParams, PushRequester, RequestError};
pub use vapid::key::{VapidKey, VapidKeyError};
pub use vapid::signer::{VapidConfig, VapidError, VapidSigner};

// vim: ts=4
