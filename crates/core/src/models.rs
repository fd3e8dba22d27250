//! Domain models for listings and price-change analysis.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One retrieved snapshot of a property listing.
///
/// The same listing id recurs across retrievals with different price and
/// area values; a snapshot itself is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
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

/// A listing snapshot paired with its most recent price movement.
///
/// `pct_change` is `(current - prev) / prev * 100` and is only ever
/// constructed for a non-zero previous price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeRecord {
    pub id: i64,
    pub title: String,
    pub current_price: Decimal,
    pub prev_price: Decimal,
    pub pct_change: Decimal,
    pub absolute_change: Decimal,
    pub rooms: Option<i32>,
    pub area: Decimal,
    pub location: String,
    pub property_url: String,
    pub current_updated_at: Option<DateTime<Utc>>,
    pub prev_updated_at: Option<DateTime<Utc>>,
}

impl PriceChangeRecord {
    /// Percentage change between two observed prices.
    ///
    /// Returns `None` when the previous price is zero, in which case the
    /// change is undefined and the record must be excluded from ranking.
    #[must_use]
    pub fn percentage_change(current: Decimal, prev: Decimal) -> Option<Decimal> {
        if prev.is_zero() {
            return None;
        }
        Some((current - prev) / prev * Decimal::from(100))
    }

    /// Magnitude of the percentage change, used for ranking.
    #[must_use]
    pub fn abs_pct_change(&self) -> Decimal {
        self.pct_change.abs()
    }
}

/// Records for one location, ranked by descending change magnitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationGroup {
    pub location: String,
    pub records: Vec<PriceChangeRecord>,
}

/// Groups records by location, ranks each group by descending
/// `|pct_change|`, and keeps the top `top_n` per group.
///
/// Groups come back sorted by location name so repeated runs over the same
/// records produce identical output. Records with a blank location are
/// dropped.
#[must_use]
pub fn group_by_location(records: Vec<PriceChangeRecord>, top_n: usize) -> Vec<LocationGroup> {
    let mut by_location: BTreeMap<String, Vec<PriceChangeRecord>> = BTreeMap::new();

    for record in records {
        if record.location.trim().is_empty() {
            continue;
        }
        by_location
            .entry(record.location.clone())
            .or_default()
            .push(record);
    }

    by_location
        .into_iter()
        .map(|(location, mut records)| {
            records.sort_by(|a, b| b.abs_pct_change().cmp(&a.abs_pct_change()));
            records.truncate(top_n);
            LocationGroup { location, records }
        })
        .collect()
}
