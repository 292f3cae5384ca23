//! Transport and stream-reconciliation primitives for the hosted search API.
//!
//! This crate owns request building, SSE parsing, and the delta/cumulative
//! reconciliation of ambiguously framed stream events. It intentionally
//! contains no persistence and no rendering coupling; callers receive display
//! increments through a sink and one assembled [`SearchResponse`] per
//! exchange.

pub use reqwest::StatusCode;

pub mod chunk;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod reconcile;
pub mod sse;
pub mod url;

pub use chunk::{ChatChunk, CostInfo, SearchResult, UsageInfo};
pub use client::{CancellationSignal, SonarApiClient};
pub use config::SonarApiConfig;
pub use error::SonarApiError;
pub use payload::{ChatMessage, ChatRequest, Role, WebSearchOptions};
pub use reconcile::{assemble_response, DeltaTracker, SearchResponse};
pub use sse::{SseFrame, SseStreamParser};
pub use url::normalize_chat_url;
