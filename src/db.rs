//! SQLite row codec helpers shared by the store modules.
//!
//! Identifiers are persisted as hyphenated UUID TEXT and timestamps as
//! RFC3339 TEXT with fixed microsecond precision so lexical ordering in
//! SQL matches chronological ordering.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Format a timestamp for storage.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored UUID column.
pub fn parse_uuid(value: &str) -> Result<Uuid, sqlx::Error> {
    value
        .parse::<Uuid>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Parse a stored timestamp column.
pub fn parse_ts(value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Parse an optional stored timestamp column.
pub fn parse_opt_ts(value: Option<&str>) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    value.map(parse_ts).transpose()
}

#[cfg(test)]
pub mod test_util {
    //! In-process database fixture for store unit tests.

    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// Single-connection in-memory database with migrations applied.
    ///
    /// One connection means one database; unit tests that need concurrent
    /// writers use a file-backed pool instead (see the integration suite).
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory database");
        sqlx::migrate!()
            .run(&pool)
            .await
            .expect("failed to run migrations");
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let now = Utc::now();
        let stored = fmt_ts(now);
        let parsed = parse_ts(&stored).unwrap();
        // Micros precision drops sub-microsecond digits
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = fmt_ts("2026-01-02T03:04:05.000001Z".parse().unwrap());
        let later = fmt_ts("2026-01-02T03:04:05.000002Z".parse().unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_uuid_round_trip() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_bad_uuid_is_decode_error() {
        assert!(parse_uuid("not-a-uuid").is_err());
    }
}
