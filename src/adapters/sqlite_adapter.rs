//! SQLite price store adapter.
//!
//! Reads the `crypto_history` table filled by the price scraper: one row per
//! (coin, price, time_stamp) observation, timestamps as local
//! `%Y-%m-%d %H:%M:%S` text.

use crate::domain::error::BotError;
use crate::domain::price::{PricePoint, PriceWindow};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PricePort;
use chrono::{Local, NaiveDateTime};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_PRICE_DB: &str = "Crypto_history.db";

pub struct SqlitePriceStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqlitePriceStore {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BotError> {
        let db_path = config
            .get_string("paths", "price_db")
            .unwrap_or_else(|| DEFAULT_PRICE_DB.to_string());
        let pool_size = config.get_int("sqlite", "pool_size", 2).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| BotError::Database {
                    reason: format!("{db_path}: {e}"),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, BotError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| BotError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, BotError> {
        self.pool.get().map_err(|e: r2d2::Error| BotError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), BotError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS crypto_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    coin TEXT,
                    price REAL,
                    time_stamp TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_crypto_history_coin_ts
                    ON crypto_history(coin, time_stamp);",
            )
            .map_err(|e: rusqlite::Error| BotError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    /// Insert observations for `coin`. Used to seed stores and in tests.
    pub fn insert_prices(&self, coin: &str, points: &[PricePoint]) -> Result<(), BotError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| BotError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for point in points {
            tx.execute(
                "INSERT INTO crypto_history (coin, price, time_stamp) VALUES (?1, ?2, ?3)",
                params![
                    coin,
                    point.price,
                    point.timestamp.format(TIMESTAMP_FORMAT).to_string()
                ],
            )
            .map_err(|e: rusqlite::Error| BotError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit().map_err(|e: rusqlite::Error| BotError::DatabaseQuery {
            reason: e.to_string(),
        })
    }

    /// All observations for `asset` strictly newer than `cutoff`.
    pub fn fetch_since(&self, asset: &str, cutoff: NaiveDateTime) -> Result<PriceWindow, BotError> {
        let unavailable = |reason: String| BotError::DataUnavailable {
            asset: asset.to_string(),
            reason,
        };

        let conn = self.conn().map_err(|e| unavailable(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT price, time_stamp FROM crypto_history
                 WHERE coin = ?1 AND time_stamp > ?2
                 ORDER BY time_stamp ASC",
            )
            .map_err(|e| unavailable(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![asset, cutoff.format(TIMESTAMP_FORMAT).to_string()],
                |row| {
                    let price: Option<f64> = row.get(0)?;
                    let ts: Option<String> = row.get(1)?;
                    Ok((price, ts))
                },
            )
            .map_err(|e| unavailable(e.to_string()))?;

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (price, ts) = row.map_err(|e| unavailable(e.to_string()))?;
            let parsed = ts
                .as_deref()
                .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok());
            match (price, parsed) {
                (Some(price), Some(timestamp)) => points.push(PricePoint::new(timestamp, price)),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(asset, skipped, "skipped malformed price rows");
        }

        Ok(PriceWindow::from_points(asset, points))
    }
}

impl PricePort for SqlitePriceStore {
    fn fetch(&self, asset: &str, lookback: chrono::Duration) -> Result<PriceWindow, BotError> {
        let cutoff = Local::now()
            .naive_local()
            .checked_sub_signed(lookback)
            .ok_or_else(|| BotError::DataUnavailable {
                asset: asset.to_string(),
                reason: format!("lookback of {} minutes is out of range", lookback.num_minutes()),
            })?;
        self.fetch_since(asset, cutoff)
    }
}
