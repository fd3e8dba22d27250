//! Data access and price-change analysis for the listing pipeline.
//!
//! This crate provides:
//! - Database client for `PostgreSQL`
//! - Typed repository over the listings table, including the schema probe
//! - The tiered price-change analyzer with synthesis fallbacks

pub mod analyzer;
pub mod database;
pub mod repository;

pub use analyzer::{AnalyzerOutcome, PriceChangeAnalyzer, Tier, TierOutcome};
pub use database::DatabaseClient;
pub use repository::{ListingRepository, SchemaProbe};
