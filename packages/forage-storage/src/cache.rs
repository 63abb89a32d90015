use serde_json::Value;
use sqlx::{PgPool, Row};
use time::{Duration, OffsetDateTime};

use crate::Result;

/// TTL cache over a single `semantic_cache` table. Reads compare the stored
/// expiry against the current time, so stale rows behave as misses without a
/// sweeper.
pub struct PgCacheStore {
	pub pool: PgPool,
}
impl PgCacheStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub async fn get(&self, key: &str) -> Result<Option<Value>> {
		let now = OffsetDateTime::now_utc();
		let row = sqlx::query(
			"SELECT payload FROM semantic_cache WHERE cache_key = $1 AND expires_at > $2",
		)
		.bind(key)
		.bind(now)
		.fetch_optional(&self.pool)
		.await?;
		let Some(row) = row else {
			return Ok(None);
		};
		let payload: Value = row.try_get("payload")?;

		sqlx::query(
			"UPDATE semantic_cache \
			SET last_accessed_at = $1, hit_count = hit_count + 1 \
			WHERE cache_key = $2",
		)
		.bind(now)
		.bind(key)
		.execute(&self.pool)
		.await?;

		Ok(Some(payload))
	}

	pub async fn set(&self, key: &str, payload: Value, ttl: Duration) -> Result<()> {
		let now = OffsetDateTime::now_utc();

		sqlx::query(
			"INSERT INTO semantic_cache \
			(cache_key, payload, created_at, last_accessed_at, expires_at, hit_count) \
			VALUES ($1, $2, $3, $3, $4, 0) \
			ON CONFLICT (cache_key) DO UPDATE SET \
			payload = EXCLUDED.payload, \
			last_accessed_at = EXCLUDED.last_accessed_at, \
			expires_at = EXCLUDED.expires_at, \
			hit_count = 0",
		)
		.bind(key)
		.bind(payload)
		.bind(now)
		.bind(now + ttl)
		.execute(&self.pool)
		.await?;

		Ok(())
	}

	pub async fn delete(&self, key: &str) -> Result<()> {
		sqlx::query("DELETE FROM semantic_cache WHERE cache_key = $1")
			.bind(key)
			.execute(&self.pool)
			.await?;

		Ok(())
	}
}
