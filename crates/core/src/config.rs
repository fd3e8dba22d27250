use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub analyzer: AnalyzerConfig,
    pub scheduler: SchedulerConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// API host, overridable for testing.
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
    pub timeout_secs: u64,
    /// Pause between chunk sends, to stay under channel rate limits.
    pub send_delay_ms: u64,
    /// Directory for failed-chunk diagnostic files.
    pub diagnostics_dir: String,
}

/// Bounds and filters for the price-change analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Listings table to analyze.
    pub table: String,
    /// Only listings with `area <= max_area` are considered.
    pub max_area: Decimal,
    /// Changes at or below this magnitude (percent) are treated as noise.
    pub noise_threshold_pct: Decimal,
    /// Changes above this magnitude (percent) are treated as data-entry
    /// artifacts and discarded.
    pub max_plausible_pct: Decimal,
    /// Ranked records kept per location.
    pub top_per_location: usize,
    /// Candidate-set size for the fallback tiers.
    pub fallback_limit: i64,
    /// Lower bound (percent) for synthesized changes.
    pub synth_min_pct: f64,
    /// Upper bound (percent) for synthesized changes.
    pub synth_max_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub cron_schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Persist each rendered report to `output_dir`.
    pub write_file: bool,
    pub output_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/listing_pulse".to_string(),
                max_connections: 5,
            },
            telegram: TelegramConfig {
                api_base: "https://api.telegram.org".to_string(),
                bot_token: String::new(),
                chat_id: String::new(),
                timeout_secs: 30,
                send_delay_ms: 1000,
                diagnostics_dir: ".".to_string(),
            },
            analyzer: AnalyzerConfig::default(),
            scheduler: SchedulerConfig {
                enabled: false,
                cron_schedule: "0 0 9 * * *".to_string(),
            },
            report: ReportConfig {
                write_file: true,
                output_dir: "reports".to_string(),
            },
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            table: "listings".to_string(),
            max_area: Decimal::new(40, 0),
            noise_threshold_pct: Decimal::new(1, 1), // 0.1
            max_plausible_pct: Decimal::new(25, 0),
            top_per_location: 3,
            fallback_limit: 1000,
            synth_min_pct: -5.0,
            synth_max_pct: 8.0,
        }
    }
}
