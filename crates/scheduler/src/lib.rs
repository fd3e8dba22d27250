//! Scheduled publication of price-change reports.
//!
//! Wires the analyzer, formatter, and Telegram client into one pipeline,
//! runnable once or on a cron schedule.

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{PipelineOutcome, PublicationPipeline};
pub use scheduler::PublicationScheduler;
