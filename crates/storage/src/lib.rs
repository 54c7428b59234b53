use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use voyage_core::{NewTripRecord, TripRecord};

/// Append-only trip log. Recency is insertion order, never the timestamp text.
pub trait TripHistoryRepository: Send + Sync {
    async fn append_trip(&self, record: NewTripRecord) -> Result<TripRecord>;
    async fn latest_trip(&self) -> Result<Option<TripRecord>>;
    async fn recent_trips(&self, limit: usize) -> Result<Vec<TripRecord>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    trips: Arc<RwLock<Vec<TripRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripHistoryRepository for MemoryStore {
    async fn append_trip(&self, record: NewTripRecord) -> Result<TripRecord> {
        let mut trips = self.trips.write();
        let id = trips.last().map_or(1, |last| last.id + 1);
        let stored = TripRecord::from_new(id, record);
        trips.push(stored.clone());
        Ok(stored)
    }

    async fn latest_trip(&self) -> Result<Option<TripRecord>> {
        Ok(self.trips.read().last().cloned())
    }

    async fn recent_trips(&self, limit: usize) -> Result<Vec<TripRecord>> {
        Ok(self.trips.read().iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);

        // One connection: every write is visible to the next read, and `sqlite::memory:`
        // stays a single database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trip_history (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              timestamp TEXT,
              source TEXT,
              destination TEXT,
              days INTEGER,
              budget INTEGER,
              total_cost INTEGER,
              hotel TEXT,
              attractions TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed creating trip_history table")?;

        Ok(())
    }
}

impl TripHistoryRepository for SqliteStore {
    async fn append_trip(&self, record: NewTripRecord) -> Result<TripRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO trip_history (timestamp, source, destination, days, budget, total_cost, hotel, attractions)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.timestamp)
        .bind(&record.source)
        .bind(&record.destination)
        .bind(i64::from(record.days))
        .bind(record.budget)
        .bind(record.total_cost)
        .bind(&record.hotel)
        .bind(&record.attractions)
        .execute(&self.pool)
        .await
        .context("failed inserting trip record")?;

        let id = result.last_insert_rowid();
        debug!(id, destination = %record.destination, "trip recorded");
        Ok(TripRecord::from_new(id, record))
    }

    async fn latest_trip(&self) -> Result<Option<TripRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, timestamp, source, destination, days, budget, total_cost, hotel, attractions
            FROM trip_history
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn recent_trips(&self, limit: usize) -> Result<Vec<TripRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, source, destination, days, budget, total_cost, hotel, attractions
            FROM trip_history
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &SqliteRow) -> Result<TripRecord> {
    let id: i64 = row.try_get("id")?;
    let days: i64 = row.try_get("days")?;

    Ok(TripRecord {
        id,
        timestamp: row.try_get::<Option<String>, _>("timestamp")?.unwrap_or_default(),
        source: row.try_get("source")?,
        destination: row.try_get::<Option<String>, _>("destination")?.unwrap_or_default(),
        days: u32::try_from(days)
            .with_context(|| format!("trip {} has an invalid day count {}", id, days))?,
        budget: row.try_get("budget")?,
        total_cost: row.try_get("total_cost")?,
        hotel: row.try_get::<Option<String>, _>("hotel")?.unwrap_or_default(),
        attractions: row.try_get::<Option<String>, _>("attractions")?.unwrap_or_default(),
    })
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl TripHistoryRepository for Store {
    async fn append_trip(&self, record: NewTripRecord) -> Result<TripRecord> {
        match self {
            Store::Memory(store) => store.append_trip(record).await,
            Store::Sqlite(store) => store.append_trip(record).await,
        }
    }

    async fn latest_trip(&self) -> Result<Option<TripRecord>> {
        match self {
            Store::Memory(store) => store.latest_trip().await,
            Store::Sqlite(store) => store.latest_trip().await,
        }
    }

    async fn recent_trips(&self, limit: usize) -> Result<Vec<TripRecord>> {
        match self {
            Store::Memory(store) => store.recent_trips(limit).await,
            Store::Sqlite(store) => store.recent_trips(limit).await,
        }
    }
}
