//! Route table assembly.

mod push;
mod subscribe;
mod unsubscribe;

use axum::routing::{delete, post};
use axum::Router;

use crate::app::App;

pub fn router() -> Router<App> {
	Router::new()
		.route("/api/v1/subscribe", post(subscribe::subscribe))
		.route("/api/v1/unsubscribe", delete(unsubscribe::unsubscribe))
		.route("/api/v1/unsubscribe/{id}", delete(unsubscribe::unsubscribe_recipient))
		.route("/api/v1/push", post(push::push))
		.route("/api/v1/push/{id}", post(push::push_recipient))
}

// vim: ts=4
