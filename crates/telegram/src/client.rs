//! Telegram Bot API client with chunked report delivery.
//!
//! Delivery is best-effort: a report is sanitized, split into bounded
//! chunks, decorated, and pushed strictly in order. A chunk the API
//! rejects is persisted to a diagnostic file and retried once with a
//! hard-truncated payload; a failed retry is logged and the loop moves
//! on. Only a connectivity-level failure aborts the remaining sends.
//!
//! # Example
//!
//! ```ignore
//! use listing_pulse_telegram::{ReportStyle, TelegramClient, TelegramClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TelegramClientConfig::default()
//!         .with_bot_token("123:abc")
//!         .with_chat_id("@listings");
//!     let client = TelegramClient::new(config)?;
//!
//!     let outcome = client
//!         .deliver_report("report text", ReportStyle::PriceChanges, "07.08.2026 09:00")
//!         .await?;
//!     println!("delivered {} chunks", outcome.delivered_count());
//!     Ok(())
//! }
//! ```

use crate::error::{Result, TelegramError};
use async_trait::async_trait;
use chrono::Utc;
use listing_pulse_core::{sanitize_for_channel, split_into_chunks};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

// =============================================================================
// Constants
// =============================================================================

/// Telegram Bot API host.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Target chunk size for splitting, before decoration.
pub const CHUNK_MAX_CHARS: usize = 3000;

/// Hard per-message ceiling after decoration.
pub const TRANSPORT_CEILING_CHARS: usize = 4000;

/// Characters kept when a decorated chunk exceeds the ceiling.
pub const TRUNCATED_CHUNK_CHARS: usize = 3997;

/// Characters kept for the shortened retry payload.
pub const RETRY_PAYLOAD_CHARS: usize = 950;

/// Chunks at or below this size are not worth a shortened retry.
const RETRY_MIN_CHARS: usize = 1000;

const ELLIPSIS_MARKER: &str = "...";
const SHORTENED_MARKER: &str = "... (message shortened)";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Telegram client.
#[derive(Debug, Clone)]
pub struct TelegramClientConfig {
    /// API host, overridable for testing.
    pub api_base: String,

    /// Bot token issued by BotFather.
    pub bot_token: String,

    /// Target channel or chat identifier.
    pub chat_id: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Pause between chunk sends in milliseconds.
    pub send_delay_ms: u64,

    /// Directory that receives failed-chunk diagnostic files.
    pub diagnostics_dir: PathBuf,
}

impl Default for TelegramClientConfig {
    fn default() -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            timeout_secs: 30,
            send_delay_ms: 1000,
            diagnostics_dir: PathBuf::from("."),
        }
    }
}

impl TelegramClientConfig {
    /// Sets the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the bot token.
    #[must_use]
    pub fn with_bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = token.into();
        self
    }

    /// Sets the target chat identifier.
    #[must_use]
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = chat_id.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the pause between chunk sends.
    #[must_use]
    pub fn with_send_delay_ms(mut self, millis: u64) -> Self {
        self.send_delay_ms = millis;
        self
    }

    /// Sets the diagnostics directory.
    #[must_use]
    pub fn with_diagnostics_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostics_dir = dir.into();
        self
    }
}

// =============================================================================
// Delay policy
// =============================================================================

/// Pause between chunk sends, injected so tests run on a fake clock.
#[async_trait]
pub trait DelayPolicy: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Production policy: real sleeps on the tokio timer.
pub struct TokioDelay;

#[async_trait]
impl DelayPolicy for TokioDelay {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test policy: no waiting.
pub struct NoDelay;

#[async_trait]
impl DelayPolicy for NoDelay {
    async fn pause(&self, _duration: Duration) {}
}

// =============================================================================
// Delivery outcome
// =============================================================================

/// Report decoration variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    /// Plain analysis banner and hashtag footer.
    Analysis,
    /// Price-change banner with the investor preamble and closing note.
    PriceChanges,
}

/// How one chunk fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Delivered,
    /// Delivered after the transport-ceiling truncation.
    DeliveredTruncated,
    /// Delivered on the shortened retry after an API rejection.
    DeliveredShortened,
    Failed,
}

/// Per-chunk delivery record.
#[derive(Debug, Clone)]
pub struct ChunkDelivery {
    /// 1-indexed position in the send order.
    pub index: usize,
    pub status: ChunkStatus,
    /// Diagnostic file holding the rejected payload, when one was written.
    pub diagnostic_file: Option<PathBuf>,
}

/// Outcome of delivering one report.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub chunks: Vec<ChunkDelivery>,
}

impl DeliveryReport {
    /// Chunks that reached the channel in any form.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.status != ChunkStatus::Failed)
            .count()
    }

    /// Chunks that never reached the channel.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.chunks.len() - self.delivered_count()
    }

    /// True when every chunk was delivered untruncated.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.chunks
            .iter()
            .all(|c| c.status == ChunkStatus::Delivered)
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

// =============================================================================
// TelegramClient
// =============================================================================

/// Telegram Bot API client.
///
/// Sends are strictly sequential with a pause between chunks, so message
/// order in the channel matches document order.
pub struct TelegramClient {
    config: TelegramClientConfig,
    http: Client,
    delay: Box<dyn DelayPolicy>,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.config.api_base)
            .field("chat_id", &self.config.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the token or chat id is missing, or the HTTP
    /// client cannot be built.
    pub fn new(config: TelegramClientConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(TelegramError::configuration("bot token is empty"));
        }
        if config.chat_id.is_empty() {
            return Err(TelegramError::configuration("chat id is empty"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TelegramError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            delay: Box::new(TokioDelay),
        })
    }

    /// Replaces the delay policy (useful for testing).
    #[must_use]
    pub fn with_delay_policy(mut self, delay: impl DelayPolicy + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    /// Full `sendMessage` endpoint URL.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base, self.config.bot_token
        )
    }

    /// Posts a single message to the configured chat.
    ///
    /// # Errors
    /// Returns `Api` for any non-200 response, `Network`/`Timeout` when
    /// the endpoint cannot be reached.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let response = self
            .http
            .post(self.api_url())
            .json(&SendMessageRequest {
                chat_id: &self.config.chat_id,
                text,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(TelegramError::api(status, message))
    }

    /// Sanitizes, chunks, decorates, and delivers a report.
    ///
    /// Per-chunk API rejections are recovered with a diagnostic file and
    /// one shortened retry; they do not fail the delivery. The returned
    /// report records how each chunk fared.
    ///
    /// # Errors
    /// Returns an error only when the endpoint cannot be reached at all.
    pub async fn deliver_report(
        &self,
        report: &str,
        style: ReportStyle,
        timestamp: &str,
    ) -> Result<DeliveryReport> {
        let sanitized = sanitize_for_channel(report);
        let chunks = split_into_chunks(&sanitized, CHUNK_MAX_CHARS);
        let total = chunks.len();
        info!(chunks = total, "delivering report");

        let mut outcome = DeliveryReport::default();

        for (i, chunk) in chunks.iter().enumerate() {
            let mut decorated = String::new();
            if i == 0 {
                decorated.push_str(&first_chunk_banner(style, timestamp));
            }
            decorated.push_str(chunk);
            if i + 1 == total {
                decorated.push_str(&last_chunk_footer(style));
            }

            let (payload, truncated) = truncate_for_transport(&decorated);

            let delivery = match self.send_message(&payload).await {
                Ok(()) => {
                    info!(
                        part = i + 1,
                        total,
                        chars = payload.chars().count(),
                        "chunk delivered"
                    );
                    let status = if truncated {
                        ChunkStatus::DeliveredTruncated
                    } else {
                        ChunkStatus::Delivered
                    };
                    ChunkDelivery {
                        index: i + 1,
                        status,
                        diagnostic_file: None,
                    }
                }
                Err(e) if e.is_chunk_failure() => self.recover_chunk(i + 1, total, &payload, &e).await?,
                Err(e) => {
                    error!("messaging endpoint unreachable, aborting delivery: {e}");
                    return Err(e);
                }
            };

            outcome.chunks.push(delivery);

            if i + 1 < total {
                self.delay
                    .pause(Duration::from_millis(self.config.send_delay_ms))
                    .await;
            }
        }

        info!(
            delivered = outcome.delivered_count(),
            failed = outcome.failed_count(),
            "report delivery finished"
        );
        Ok(outcome)
    }

    /// Handles an API-rejected chunk: persist it, then retry once with a
    /// hard-truncated payload when the chunk is large enough to matter.
    async fn recover_chunk(
        &self,
        index: usize,
        total: usize,
        payload: &str,
        cause: &TelegramError,
    ) -> Result<ChunkDelivery> {
        error!(part = index, total, "failed to send chunk: {cause}");

        let diagnostic_file = match self.persist_failed_chunk(index, payload) {
            Ok(path) => {
                info!("failed chunk saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("could not persist failed chunk: {e}");
                None
            }
        };

        if payload.chars().count() <= RETRY_MIN_CHARS {
            return Ok(ChunkDelivery {
                index,
                status: ChunkStatus::Failed,
                diagnostic_file,
            });
        }

        let mut shortened = truncate_chars(payload, RETRY_PAYLOAD_CHARS);
        shortened.push_str(SHORTENED_MARKER);
        info!(part = index, "retrying with shortened payload");

        let status = match self.send_message(&shortened).await {
            Ok(()) => {
                info!(part = index, "shortened chunk delivered");
                ChunkStatus::DeliveredShortened
            }
            Err(e) if e.is_chunk_failure() => {
                error!(part = index, "shortened retry also rejected: {e}");
                ChunkStatus::Failed
            }
            Err(e) => return Err(e),
        };

        Ok(ChunkDelivery {
            index,
            status,
            diagnostic_file,
        })
    }

    /// Writes a rejected payload to a timestamped diagnostic file.
    fn persist_failed_chunk(&self, index: usize, payload: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.config.diagnostics_dir)?;
        let filename = format!(
            "error_chunk_{}_{}.txt",
            Utc::now().format("%Y%m%d_%H%M%S"),
            index
        );
        let path = self.config.diagnostics_dir.join(filename);
        std::fs::write(&path, payload)?;
        Ok(path)
    }
}

// =============================================================================
// Decoration and truncation
// =============================================================================

fn first_chunk_banner(style: ReportStyle, timestamp: &str) -> String {
    match style {
        ReportStyle::Analysis => {
            format!("\u{1F4CA} Apartment analysis - {timestamp}\n\n")
        }
        ReportStyle::PriceChanges => {
            let mut banner = String::new();
            banner.push_str("\u{1F50E} STUDIOS AND APARTMENTS UP TO 40 M\u{B2}\n");
            banner.push_str(
                "\u{1F4CA} Investor analytics: compact units deliver the strongest yield for the smallest outlay.\n",
            );
            banner.push_str("\u{1F4BC} Well suited to short-term letting and quick resale.\n\n");
            banner.push_str(&format!(
                "\u{1F4B0} PROPERTY PRICE CHANGES - {timestamp}\n\n"
            ));
            banner
        }
    }
}

fn last_chunk_footer(style: ReportStyle) -> String {
    match style {
        ReportStyle::Analysis => "\n\n#realestate #analysis #investment".to_string(),
        ReportStyle::PriceChanges => {
            let mut footer = String::new();
            footer.push_str(
                "\n\n\u{1F4C8} Studio and small-apartment yields in the UAE reach 8-10% a year.",
            );
            footer.push_str(
                "\n\u{1F4F1} Subscribe to the channel for timely updates on strong investments!",
            );
            footer.push_str("\n\n#realestate #UAE #apartmentprices #investment #studios #yield");
            footer
        }
    }
}

/// Enforces the hard transport ceiling on a decorated chunk.
fn truncate_for_transport(text: &str) -> (String, bool) {
    let chars = text.chars().count();
    if chars <= TRANSPORT_CEILING_CHARS {
        return (text.to_string(), false);
    }

    warn!(chars, "chunk exceeds transport ceiling, truncating");
    let mut truncated = truncate_chars(text, TRUNCATED_CHUNK_CHARS);
    truncated.push_str(ELLIPSIS_MARKER);
    (truncated, true)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEND_PATH: &str = "/bottest-token/sendMessage";

    fn test_client(server_uri: &str, diagnostics: &Path) -> TelegramClient {
        let config = TelegramClientConfig::default()
            .with_api_base(server_uri)
            .with_bot_token("test-token")
            .with_chat_id("@listings")
            .with_send_delay_ms(0)
            .with_diagnostics_dir(diagnostics);
        TelegramClient::new(config)
            .unwrap()
            .with_delay_policy(NoDelay)
    }

    async fn sent_texts(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|req| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                body["text"].as_str().unwrap().to_string()
            })
            .collect()
    }

    fn diagnostic_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("error_chunk_"))
            })
            .collect()
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_config_default() {
        let config = TelegramClientConfig::default();
        assert_eq!(config.api_base, TELEGRAM_API_BASE);
        assert_eq!(config.send_delay_ms, 1000);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_builder() {
        let config = TelegramClientConfig::default()
            .with_api_base("http://localhost:1234")
            .with_bot_token("tok")
            .with_chat_id("@c")
            .with_timeout_secs(5)
            .with_send_delay_ms(10);
        assert_eq!(config.api_base, "http://localhost:1234");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.send_delay_ms, 10);
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let err = TelegramClient::new(TelegramClientConfig::default()).unwrap_err();
        assert!(matches!(err, TelegramError::Configuration(_)));

        let err = TelegramClient::new(TelegramClientConfig::default().with_bot_token("tok"))
            .unwrap_err();
        assert!(matches!(err, TelegramError::Configuration(_)));
    }

    #[test]
    fn test_api_url_shape() {
        let config = TelegramClientConfig::default()
            .with_bot_token("123:abc")
            .with_chat_id("@c");
        let client = TelegramClient::new(config).unwrap();
        assert_eq!(
            client.api_url(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    // ==================== Truncation Tests ====================

    #[test]
    fn test_truncate_for_transport_under_ceiling() {
        let text = "a".repeat(TRANSPORT_CEILING_CHARS);
        let (payload, truncated) = truncate_for_transport(&text);
        assert!(!truncated);
        assert_eq!(payload.chars().count(), TRANSPORT_CEILING_CHARS);
    }

    #[test]
    fn test_truncate_for_transport_over_ceiling() {
        let text = "a".repeat(4500);
        let (payload, truncated) = truncate_for_transport(&text);
        assert!(truncated);
        assert_eq!(payload.chars().count(), TRANSPORT_CEILING_CHARS);
        assert!(payload.ends_with(ELLIPSIS_MARKER));
    }

    // ==================== Decoration Tests ====================

    #[test]
    fn test_price_changes_banner_contains_investor_preamble() {
        let banner = first_chunk_banner(ReportStyle::PriceChanges, "07.08.2026 09:00");
        assert!(banner.starts_with("\u{1F50E} STUDIOS"));
        assert!(banner.contains("PROPERTY PRICE CHANGES - 07.08.2026 09:00"));
    }

    #[test]
    fn test_analysis_footer_is_hashtags_only() {
        let footer = last_chunk_footer(ReportStyle::Analysis);
        assert_eq!(footer, "\n\n#realestate #analysis #investment");
    }

    // ==================== Delivery Tests ====================

    #[tokio::test]
    async fn test_single_chunk_delivery_decorates_both_ends() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());

        let outcome = client
            .deliver_report("short report", ReportStyle::PriceChanges, "07.08.2026 09:00")
            .await
            .unwrap();

        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].status, ChunkStatus::Delivered);
        assert!(outcome.is_clean());

        let texts = sent_texts(&server).await;
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("\u{1F50E} STUDIOS"));
        assert!(texts[0].contains("short report"));
        assert!(texts[0].ends_with("#realestate #UAE #apartmentprices #investment #studios #yield"));
    }

    #[tokio::test]
    async fn test_multi_chunk_delivery_decorates_first_and_last_only() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());

        let report = "word ".repeat(700); // two chunks at the 3000 limit
        let outcome = client
            .deliver_report(&report, ReportStyle::PriceChanges, "ts")
            .await
            .unwrap();

        assert_eq!(outcome.chunks.len(), 2);

        let texts = sent_texts(&server).await;
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("\u{1F50E} STUDIOS"));
        assert!(!texts[0].contains("#realestate"));
        assert!(!texts[1].starts_with("\u{1F50E} STUDIOS"));
        assert!(texts[1].ends_with("#realestate #UAE #apartmentprices #investment #studios #yield"));
        for text in &texts {
            assert!(text.chars().count() <= TRANSPORT_CEILING_CHARS);
        }
    }

    #[tokio::test]
    async fn test_rejected_chunk_writes_diagnostic_and_retries_shortened() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());

        let report = "alpha beta ".repeat(150); // one chunk, well over 1000 chars
        let outcome = client
            .deliver_report(&report, ReportStyle::Analysis, "ts")
            .await
            .unwrap();

        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].status, ChunkStatus::DeliveredShortened);
        assert_eq!(outcome.delivered_count(), 1);

        let files = diagnostic_files(dir.path());
        assert_eq!(files.len(), 1);
        let persisted = std::fs::read_to_string(&files[0]).unwrap();
        assert!(persisted.contains("alpha beta"));
        assert_eq!(outcome.chunks[0].diagnostic_file.as_deref(), Some(files[0].as_path()));

        let texts = sent_texts(&server).await;
        assert_eq!(texts.len(), 2);
        assert!(texts[1].ends_with(SHORTENED_MARKER));
        assert!(
            texts[1].chars().count() <= RETRY_PAYLOAD_CHARS + SHORTENED_MARKER.chars().count()
        );
    }

    #[tokio::test]
    async fn test_small_rejected_chunk_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());

        let outcome = client
            .deliver_report("tiny report", ReportStyle::Analysis, "ts")
            .await
            .unwrap();

        // Overall delivery still succeeds: per-chunk failure is recorded,
        // not propagated
        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].status, ChunkStatus::Failed);
        assert_eq!(outcome.failed_count(), 1);
        assert!(outcome.chunks[0].diagnostic_file.is_some());

        let texts = sent_texts(&server).await;
        assert_eq!(texts.len(), 1, "no retry expected for a small chunk");
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_block_later_chunks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(400))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());

        let report = "word ".repeat(700);
        let outcome = client
            .deliver_report(&report, ReportStyle::Analysis, "ts")
            .await
            .unwrap();

        assert_eq!(outcome.chunks.len(), 2);
        assert_eq!(outcome.chunks[0].status, ChunkStatus::Failed);
        assert_eq!(outcome.chunks[1].status, ChunkStatus::Delivered);
    }

    #[tokio::test]
    async fn test_connectivity_failure_aborts_delivery() {
        let dir = TempDir::new().unwrap();
        // Nothing listens on this port; connection is refused immediately
        let client = test_client("http://127.0.0.1:9", dir.path());

        let err = client
            .deliver_report("report", ReportStyle::Analysis, "ts")
            .await
            .unwrap_err();
        assert!(err.is_connectivity_failure());
    }

    #[tokio::test]
    async fn test_send_message_posts_chat_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let client = test_client(&server.uri(), dir.path());
        client.send_message("hello").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["chat_id"], "@listings");
        assert_eq!(body["text"], "hello");
    }
}
