//! Integration tests against a real Postgres instance.
//!
//! Ignored by default — like cloudillo's sqlite adapter tests these need
//! a live database, but Postgres (unlike sqlite) can't be spun up as a temp
//! file; point `DATABASE_URL` at a scratch database and run with
//! `cargo test -- --ignored` to exercise them.

use sqlx::Row;
use webpush_postgres::SubscriptionRepositoryPostgres;
use webpush_types::{Keys, NewSubscription, SubscriptionRepository};

async fn repo() -> SubscriptionRepositoryPostgres {
	let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch Postgres database");
	SubscriptionRepositoryPostgres::new(&url).await.expect("connect")
}

/// Counts `webpush_keys` rows for `endpoint` by connecting directly, bypassing
/// the repository, so a test can see an orphan the adapter's own reads would
/// filter out (a dangling key row is never joined back by `SELECT_LIVE`).
async fn keys_row_count_for(endpoint: &str) -> i64 {
	let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch Postgres database");
	let pool = sqlx::PgPool::connect(&url).await.expect("connect");
	let row = sqlx::query("SELECT COUNT(*) AS n FROM webpush_keys WHERE subscription_endpoint = $1")
		.bind(endpoint)
		.fetch_one(&pool)
		.await
		.expect("count");
	row.try_get::<i64, _>("n").expect("count column")
}

fn subscription(endpoint: &str, client_id: &str, recipient_id: &str) -> NewSubscription {
	NewSubscription {
		endpoint: endpoint.to_string(),
		client_id: client_id.to_string(),
		recipient_id: recipient_id.to_string(),
		expiration_time: None,
		keys: Keys { p256dh: "p".repeat(87), auth: "a".repeat(22) },
	}
}

#[tokio::test]
#[ignore]
async fn save_then_get_by_client_round_trips() {
	let repo = repo().await;
	let endpoint = "https://push.example/test-save-get";
	repo.save(&subscription(endpoint, "tenant-save-get", "user-1")).await.expect("save");

	let found = repo.get_by_client("tenant-save-get").await.expect("get_by_client");
	assert!(found.iter().any(|s| s.endpoint == endpoint));

	repo.delete_by_endpoint(endpoint).await.expect("cleanup");
}

#[tokio::test]
#[ignore]
async fn delete_by_endpoint_is_idempotent() {
	let repo = repo().await;
	repo.delete_by_endpoint("https://push.example/never-existed").await.expect("idempotent delete");
}

#[tokio::test]
#[ignore]
async fn expired_subscription_is_excluded_from_live_lookups() {
	let repo = repo().await;
	let endpoint = "https://push.example/test-expired";
	let mut sub = subscription(endpoint, "tenant-expired", "user-1");
	sub.expiration_time = Some(1);
	repo.save(&sub).await.expect("save");

	let found = repo.get_by_client("tenant-expired").await.expect("get_by_client");
	assert!(!found.iter().any(|s| s.endpoint == endpoint));

	repo.delete_by_endpoint(endpoint).await.expect("cleanup");
}

#[tokio::test]
#[ignore]
async fn has_any_by_client_reflects_presence() {
	let repo = repo().await;
	let endpoint = "https://push.example/test-has-any";
	assert!(!repo.has_any_by_client("tenant-has-any").await.expect("has_any"));

	repo.save(&subscription(endpoint, "tenant-has-any", "user-1")).await.expect("save");
	assert!(repo.has_any_by_client("tenant-has-any").await.expect("has_any"));

	repo.delete_by_endpoint(endpoint).await.expect("cleanup");
}

#[tokio::test]
#[ignore]
async fn delete_by_endpoint_leaves_no_orphaned_keys_row() {
	let repo = repo().await;
	let endpoint = "https://push.example/test-delete-cascade";
	repo.save(&subscription(endpoint, "tenant-delete-cascade", "user-1")).await.expect("save");
	assert_eq!(keys_row_count_for(endpoint).await, 1);

	repo.delete_by_endpoint(endpoint).await.expect("delete");
	assert_eq!(keys_row_count_for(endpoint).await, 0, "keys row must cascade away with its subscription");
}

#[tokio::test]
#[ignore]
async fn save_rotating_p256dh_does_not_orphan_the_old_keys_row() {
	let repo = repo().await;
	let endpoint = "https://push.example/test-rotate-keys";
	let mut sub = subscription(endpoint, "tenant-rotate-keys", "user-1");
	repo.save(&sub).await.expect("initial save");

	sub.keys = Keys { p256dh: "q".repeat(87), auth: "b".repeat(22) };
	repo.save(&sub).await.expect("rotating save");

	let rotated = keys_row_count_for(endpoint).await;
	assert_eq!(rotated, 1, "rotating p256dh must update the row in place, not insert a new one");
	let found = repo.get_by_client("tenant-rotate-keys").await.expect("get_by_client");
	let found = found.iter().find(|s| s.endpoint == endpoint).expect("subscription present");
	assert_eq!(found.keys.p256dh, "q".repeat(87));

	repo.delete_by_endpoint(endpoint).await.expect("cleanup");
}
