//! Typed access to the listings table.
//!
//! The repository owns the schema probe and the two retrieval queries the
//! analyzer degrades through: the windowed price-history query and the
//! recent-listings candidate query.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use listing_pulse_core::models::{Listing, PriceChangeRecord};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Columns the windowed price-history query depends on.
pub const REQUIRED_COLUMNS: [&str; 3] = ["updated_at", "id", "price"];

/// Result of probing `information_schema` for the required columns.
#[derive(Debug, Clone)]
pub struct SchemaProbe {
    available: Vec<String>,
}

impl SchemaProbe {
    #[must_use]
    pub fn new(available: Vec<String>) -> Self {
        Self { available }
    }

    /// True when every column the window query needs is present.
    #[must_use]
    pub fn has_required(&self) -> bool {
        self.missing().is_empty()
    }

    /// Required columns absent from the probed table.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !self.available.iter().any(|a| a == col))
            .collect()
    }

    /// True when the table records update timestamps.
    #[must_use]
    pub fn has_updated_at(&self) -> bool {
        self.available.iter().any(|a| a == "updated_at")
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceChangeRow {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub rooms: Option<i32>,
    pub area: Decimal,
    pub location: String,
    pub property_url: String,
    pub current_updated_at: Option<DateTime<Utc>>,
    pub prev_updated_at: Option<DateTime<Utc>>,
    pub prev_price: Decimal,
    pub pct_change: Decimal,
    pub absolute_change: Decimal,
}

impl From<PriceChangeRow> for PriceChangeRecord {
    fn from(row: PriceChangeRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            current_price: row.price,
            prev_price: row.prev_price,
            pct_change: row.pct_change,
            absolute_change: row.absolute_change,
            rooms: row.rooms,
            area: row.area,
            location: row.location,
            property_url: row.property_url,
            current_updated_at: row.current_updated_at,
            prev_updated_at: row.prev_updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub rooms: Option<i32>,
    pub baths: Option<i32>,
    pub area: Decimal,
    pub location: String,
    pub property_url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            price: row.price,
            rooms: row.rooms,
            baths: row.baths,
            area: row.area,
            location: row.location,
            property_url: row.property_url,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for listing retrieval.
#[derive(Debug, Clone)]
pub struct ListingRepository {
    pool: PgPool,
    table: String,
}

impl ListingRepository {
    /// Creates a repository over the given listings table.
    ///
    /// # Errors
    /// Returns an error if the table name contains characters outside
    /// `[A-Za-z0-9_]` (table names cannot be bound as query parameters).
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("invalid listings table name: {table:?}");
        }
        Ok(Self { pool, table })
    }

    /// Probes `information_schema` for the columns the window query needs.
    ///
    /// # Errors
    /// Returns an error if the probe query fails.
    pub async fn probe_schema(&self) -> Result<SchemaProbe> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT column_name
            FROM information_schema.columns
            WHERE table_name = $1
            AND column_name = ANY($2)
            ",
        )
        .bind(&self.table)
        .bind(REQUIRED_COLUMNS.map(String::from).to_vec())
        .fetch_all(&self.pool)
        .await
        .context("Failed to probe listings schema")?;

        Ok(SchemaProbe::new(rows.into_iter().map(|(col,)| col).collect()))
    }

    /// Computes per-listing price changes from recorded history.
    ///
    /// Ranks each listing's rows by `updated_at` descending and compares
    /// the most recent price against its predecessor. Listings without a
    /// defined, above-noise change are excluded in SQL; the plausibility
    /// ceiling is applied by the analyzer.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_price_changes(
        &self,
        noise_threshold_pct: Decimal,
        max_area: Decimal,
    ) -> Result<Vec<PriceChangeRow>> {
        let query = format!(
            r"
            WITH price_history AS (
                SELECT
                    id,
                    price,
                    updated_at,
                    LAG(price) OVER (PARTITION BY id ORDER BY updated_at) AS prev_price,
                    LAG(updated_at) OVER (PARTITION BY id ORDER BY updated_at) AS prev_updated_at,
                    ROW_NUMBER() OVER (PARTITION BY id ORDER BY updated_at DESC) AS rn
                FROM {table}
                WHERE price > 0 AND updated_at IS NOT NULL
            ),
            price_changes AS (
                SELECT
                    ph.id,
                    ph.price AS current_price,
                    ph.prev_price,
                    ph.updated_at AS current_updated_at,
                    ph.prev_updated_at,
                    CASE
                        WHEN ph.prev_price IS NOT NULL AND ph.prev_price <> 0
                        THEN (ph.price - ph.prev_price) / ph.prev_price * 100
                        ELSE NULL
                    END AS pct_change,
                    CASE
                        WHEN ph.prev_price IS NOT NULL
                        THEN ph.price - ph.prev_price
                        ELSE NULL
                    END AS absolute_change
                FROM price_history ph
                WHERE ph.rn = 1 AND ph.prev_price IS NOT NULL
            )
            SELECT
                l.id,
                COALESCE(l.title, '') AS title,
                pc.current_price AS price,
                l.rooms,
                l.area,
                COALESCE(l.location, '') AS location,
                COALESCE(l.property_url, '') AS property_url,
                pc.current_updated_at,
                pc.prev_updated_at,
                pc.prev_price,
                pc.pct_change,
                pc.absolute_change
            FROM price_changes pc
            JOIN {table} l ON pc.id = l.id AND l.updated_at = pc.current_updated_at
            WHERE pc.pct_change IS NOT NULL
            AND ABS(pc.pct_change) > $1
            AND l.area > 0 AND l.area <= $2
            ORDER BY ABS(pc.pct_change) DESC
            ",
            table = self.table
        );

        sqlx::query_as::<_, PriceChangeRow>(&query)
            .bind(noise_threshold_pct)
            .bind(max_area)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query price changes")
    }

    /// Fetches the most recently updated listings within the area filter,
    /// as the candidate set for the synthesis fallback.
    ///
    /// When the table has no `updated_at` column the candidates are
    /// ordered by id descending instead.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_recent_listings(
        &self,
        max_area: Decimal,
        limit: i64,
        order_by_updated: bool,
    ) -> Result<Vec<ListingRow>> {
        let (updated_at_column, order_clause) = if order_by_updated {
            ("updated_at", "updated_at DESC NULLS LAST")
        } else {
            ("NULL::timestamptz AS updated_at", "id DESC")
        };

        let query = format!(
            r"
            SELECT
                id,
                COALESCE(title, '') AS title,
                price,
                rooms,
                baths,
                area,
                COALESCE(location, '') AS location,
                COALESCE(property_url, '') AS property_url,
                {updated_at_column}
            FROM {table}
            WHERE price > 0
            AND area > 0 AND area <= $1
            ORDER BY {order_clause}
            LIMIT $2
            ",
            table = self.table
        );

        sqlx::query_as::<_, ListingRow>(&query)
            .bind(max_area)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query recent listings")
    }
}
