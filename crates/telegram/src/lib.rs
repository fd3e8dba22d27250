//! Telegram channel delivery for the listing price pipeline.
//!
//! Provides a typed client over the Bot API `sendMessage` endpoint that
//! sanitizes, chunks, and decorates a report, then pushes the chunks in
//! order with per-chunk truncation and retry handling.

pub mod client;
pub mod error;

pub use client::{
    ChunkDelivery, ChunkStatus, DelayPolicy, DeliveryReport, NoDelay, ReportStyle,
    TelegramClient, TelegramClientConfig, TokioDelay,
};
pub use error::{Result, TelegramError};
