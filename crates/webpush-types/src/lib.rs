//! Shared data types for the web push delivery service: the subscription
//! model, the repository contract the core depends on, and the error
//! envelope every layer of the stack converges on.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod repository;
pub mod subscription;

pub use error::{ClResult, Error, ErrorMeta, ErrorObject, ErrorResponse};
pub use repository::SubscriptionRepository;
pub use subscription::{Keys, NewSubscription, Subscription};
