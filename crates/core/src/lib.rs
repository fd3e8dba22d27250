//! Core types and pure logic for the listing price pipeline.
//!
//! This crate provides:
//! - Domain models for listings and price-change records
//! - Application configuration with figment-based loading
//! - The plain-text report formatter
//! - Text chunking for size-limited message transports
//! - Report sanitization helpers

pub mod chunker;
pub mod config;
pub mod config_loader;
pub mod formatter;
pub mod models;
pub mod sanitize;

pub use chunker::split_into_chunks;
pub use config::{
    AnalyzerConfig, AppConfig, DatabaseConfig, ReportConfig, SchedulerConfig, TelegramConfig,
};
pub use config_loader::ConfigLoader;
pub use formatter::ReportFormatter;
pub use models::{group_by_location, Listing, LocationGroup, PriceChangeRecord};
pub use sanitize::sanitize_for_channel;
