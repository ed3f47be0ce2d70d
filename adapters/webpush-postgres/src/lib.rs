//! Postgres-backed [`SubscriptionRepository`].
//!
//! Grounded on `cloudillo-meta-adapter-sqlite::push` for the query shapes
//! (list/create/delete) and on `cloudillo-auth-adapter-sqlite`'s
//! `init_db`/connect-on-`new` pattern, adapted from SQLite to Postgres:
//! `$n` placeholders and a connection pool built from a URL instead of a
//! file path. The child `webpush_keys` table cascading off its owning
//! `webpush_subscriptions` row is grounded on `langkebo-synapse-rust`'s
//! `device_keys` table, which carries the same shape: a child row with its
//! own primary key plus a `FOREIGN KEY ... ON DELETE CASCADE` back to its
//! one owning parent row, so deleting the parent can never leave the child
//! behind.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};

use webpush_types::{ClResult, Error, Keys, NewSubscription, Subscription, SubscriptionRepository};

pub struct SubscriptionRepositoryPostgres {
	pool: PgPool,
}

impl std::fmt::Debug for SubscriptionRepositoryPostgres {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SubscriptionRepositoryPostgres").finish_non_exhaustive()
	}
}

impl SubscriptionRepositoryPostgres {
	pub async fn new(database_url: &str) -> ClResult<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(10)
			.connect(database_url)
			.await
			.inspect_err(|err| tracing::warn!("DB: failed to connect: {err:#?}"))
			.map_err(|err| Error::Internal(err.to_string()))?;

		init_db(&pool).await.map_err(|err| Error::Internal(err.to_string()))?;

		Ok(Self { pool })
	}

	/// Wraps an already-open pool (and assumes migrations have run), for
	/// callers that manage the pool lifetime themselves.
	pub fn from_pool(pool: PgPool) -> Self {
		Self { pool }
	}
}

async fn init_db(pool: &PgPool) -> Result<(), sqlx::Error> {
	let mut tx = pool.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS webpush_subscriptions (
			endpoint text PRIMARY KEY,
			client_id text NOT NULL,
			recipient_id text NOT NULL,
			expiration_time bigint,
			created_at timestamptz NOT NULL DEFAULT now()
		)",
	)
	.execute(&mut *tx)
	.await?;

	// `subscription_endpoint` is UNIQUE, not just indexed: each subscription
	// has exactly one Keys row (has-one), and `ON DELETE CASCADE` is what
	// keeps that true as subscriptions are deleted.
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS webpush_keys (
			p256dh text PRIMARY KEY,
			auth text NOT NULL,
			subscription_endpoint text NOT NULL UNIQUE
				REFERENCES webpush_subscriptions(endpoint) ON DELETE CASCADE
		)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS webpush_subscriptions_client_idx ON webpush_subscriptions (client_id)")
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS webpush_subscriptions_client_recipient_idx \
		 ON webpush_subscriptions (client_id, recipient_id)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await
}

fn now_ms() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

fn inspect(err: &sqlx::Error) {
	tracing::warn!("DB: {err:#?}");
}

fn row_to_subscription(row: PgRow) -> Result<Subscription, sqlx::Error> {
	Ok(Subscription {
		endpoint: row.try_get("endpoint")?,
		client_id: row.try_get("client_id")?,
		recipient_id: row.try_get("recipient_id")?,
		expiration_time: row.try_get("expiration_time")?,
		keys: Keys { p256dh: row.try_get("p256dh")?, auth: row.try_get("auth")? },
	})
}

const SELECT_LIVE: &str = "SELECT s.endpoint, s.client_id, s.recipient_id, s.expiration_time, k.p256dh, k.auth
	FROM webpush_subscriptions s
	JOIN webpush_keys k ON k.subscription_endpoint = s.endpoint
	WHERE s.client_id = $1 AND (s.expiration_time IS NULL OR s.expiration_time > $2)
	ORDER BY s.endpoint";

#[async_trait]
impl SubscriptionRepository for SubscriptionRepositoryPostgres {
	async fn get_by_client(&self, client_id: &str) -> ClResult<Vec<Subscription>> {
		let rows = sqlx::query(SELECT_LIVE)
			.bind(client_id)
			.bind(now_ms())
			.fetch_all(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;

		rows.into_iter()
			.map(|row| row_to_subscription(row).map_err(|err| Error::Internal(err.to_string())))
			.collect()
	}

	async fn get_by_client_and_recipient(
		&self,
		client_id: &str,
		recipient_id: &str,
	) -> ClResult<Vec<Subscription>> {
		let query = format!("{SELECT_LIVE} AND s.recipient_id = $3");
		let rows = sqlx::query(&query)
			.bind(client_id)
			.bind(now_ms())
			.bind(recipient_id)
			.fetch_all(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;

		rows.into_iter()
			.map(|row| row_to_subscription(row).map_err(|err| Error::Internal(err.to_string())))
			.collect()
	}

	/// Idempotent: a missing endpoint is not an error. The matching
	/// `webpush_keys` row cascades away with it — see `init_db`.
	async fn delete_by_endpoint(&self, endpoint: &str) -> ClResult<()> {
		sqlx::query("DELETE FROM webpush_subscriptions WHERE endpoint = $1")
			.bind(endpoint)
			.execute(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;
		Ok(())
	}

	async fn save(&self, subscription: &NewSubscription) -> ClResult<()> {
		let mut tx =
			self.pool.begin().await.inspect_err(inspect).map_err(|err| Error::Internal(err.to_string()))?;

		// Subscription first: `webpush_keys.subscription_endpoint` references it.
		sqlx::query(
			"INSERT INTO webpush_subscriptions (endpoint, client_id, recipient_id, expiration_time)
			 VALUES ($1, $2, $3, $4)
			 ON CONFLICT (endpoint) DO UPDATE SET
				client_id = EXCLUDED.client_id,
				recipient_id = EXCLUDED.recipient_id,
				expiration_time = EXCLUDED.expiration_time",
		)
		.bind(&subscription.endpoint)
		.bind(&subscription.client_id)
		.bind(&subscription.recipient_id)
		.bind(subscription.expiration_time)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|err| Error::Internal(err.to_string()))?;

		// Upsert keyed on `subscription_endpoint`, not `p256dh`: a re-subscribe
		// that rotates `p256dh` updates this same row in place instead of
		// inserting a new one and orphaning the old key.
		sqlx::query(
			"INSERT INTO webpush_keys (p256dh, auth, subscription_endpoint) VALUES ($1, $2, $3)
			 ON CONFLICT (subscription_endpoint) DO UPDATE SET
				p256dh = EXCLUDED.p256dh,
				auth = EXCLUDED.auth",
		)
		.bind(&subscription.keys.p256dh)
		.bind(&subscription.keys.auth)
		.bind(&subscription.endpoint)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|err| Error::Internal(err.to_string()))?;

		tx.commit().await.inspect_err(inspect).map_err(|err| Error::Internal(err.to_string()))?;
		Ok(())
	}

	async fn delete_by_client(&self, client_id: &str) -> ClResult<()> {
		sqlx::query("DELETE FROM webpush_subscriptions WHERE client_id = $1")
			.bind(client_id)
			.execute(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;
		Ok(())
	}

	async fn delete_by_client_and_recipient(&self, client_id: &str, recipient_id: &str) -> ClResult<()> {
		sqlx::query("DELETE FROM webpush_subscriptions WHERE client_id = $1 AND recipient_id = $2")
			.bind(client_id)
			.bind(recipient_id)
			.execute(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;
		Ok(())
	}

	async fn has_any_by_client(&self, client_id: &str) -> ClResult<bool> {
		let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM webpush_subscriptions WHERE client_id = $1) AS present")
			.bind(client_id)
			.fetch_one(&self.pool)
			.await
			.inspect_err(inspect)
			.map_err(|err| Error::Internal(err.to_string()))?;
		row.try_get::<bool, _>("present").map_err(|err| Error::Internal(err.to_string()))
	}
}

// vim: ts=4
