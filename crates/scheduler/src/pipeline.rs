//! One publication run: analyze, format, persist, deliver.

use anyhow::{Context, Result};
use chrono::Utc;
use listing_pulse_core::{AppConfig, ReportFormatter};
use listing_pulse_data::{AnalyzerOutcome, DatabaseClient, PriceChangeAnalyzer};
use listing_pulse_telegram::{
    DeliveryReport, ReportStyle, TelegramClient, TelegramClientConfig,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How a pipeline run ended.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// No tier produced usable records; nothing was sent.
    NoData,
    /// The report was delivered (possibly with per-chunk failures).
    Published(DeliveryReport),
}

pub struct PublicationPipeline {
    config: AppConfig,
}

impl PublicationPipeline {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Runs the full pipeline once.
    ///
    /// The store connection is opened for the analysis query sequence and
    /// closed before formatting begins; nothing is held across the
    /// chunking and delivery phases. Per-chunk delivery failures are
    /// recorded in the outcome, not raised.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable, the Telegram
    /// client cannot be built, or the messaging endpoint is unreachable.
    pub async fn run_once(&self) -> Result<PipelineOutcome> {
        info!("starting price-change publication run");

        let Some(report) = self.render_report().await? else {
            info!("no price-change data available, skipping publication");
            return Ok(PipelineOutcome::NoData);
        };

        if self.config.report.write_file {
            match write_report_file(Path::new(&self.config.report.output_dir), &report) {
                Ok(path) => info!("report saved to {}", path.display()),
                Err(e) => warn!("could not persist report file: {e:#}"),
            }
        }

        let telegram_config = TelegramClientConfig::default()
            .with_api_base(self.config.telegram.api_base.clone())
            .with_bot_token(self.config.telegram.bot_token.clone())
            .with_chat_id(self.config.telegram.chat_id.clone())
            .with_timeout_secs(self.config.telegram.timeout_secs)
            .with_send_delay_ms(self.config.telegram.send_delay_ms)
            .with_diagnostics_dir(self.config.telegram.diagnostics_dir.clone());
        let client = TelegramClient::new(telegram_config).context("Failed to build Telegram client")?;

        let timestamp = Utc::now().format("%d.%m.%Y %H:%M").to_string();
        let delivery = client
            .deliver_report(&report, ReportStyle::PriceChanges, &timestamp)
            .await
            .context("Report delivery failed")?;

        info!(
            delivered = delivery.delivered_count(),
            failed = delivery.failed_count(),
            "publication run finished"
        );
        Ok(PipelineOutcome::Published(delivery))
    }

    /// Runs the analysis and formatting stages only.
    ///
    /// Returns `None` when no tier produced usable records.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the analyzer's
    /// schema probe fails.
    pub async fn render_report(&self) -> Result<Option<String>> {
        let db = DatabaseClient::new(
            &self.config.database.url,
            self.config.database.max_connections,
        )
        .await
        .context("Failed to connect to the listing store")?;

        let analyzer = PriceChangeAnalyzer::new(db.pool().clone(), self.config.analyzer.clone())
            .context("Failed to build analyzer")?;
        let outcome = analyzer.analyze().await;
        db.close().await;

        let groups = match outcome? {
            AnalyzerOutcome::NoData => return Ok(None),
            AnalyzerOutcome::Report(groups) => groups,
        };

        let formatter = ReportFormatter::new(self.config.analyzer.max_area);
        Ok(Some(formatter.format(&groups)))
    }
}

/// Writes the rendered report to a timestamped file under `output_dir`.
fn write_report_file(output_dir: &Path, report: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let filename = format!("price_changes_{}.txt", Utc::now().format("%Y%m%d_%H%M%S"));
    let path = output_dir.join(filename);
    std::fs::write(&path, report).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_file_creates_timestamped_file() {
        let dir = TempDir::new().unwrap();
        let path = write_report_file(dir.path(), "report body").unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("price_changes_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "report body");
    }

    #[test]
    fn test_write_report_file_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports");
        let path = write_report_file(&nested, "x").unwrap();
        assert!(path.starts_with(&nested));
    }
}
