//! Terminal client for hosted LLM web search.
//!
//! The core is split across the workspace: `sonar_api` reconciles the
//! ambiguously framed response stream, `transcript_store` keeps the durable
//! conversation log, and this crate orchestrates one exchange at a time with
//! commit-or-rollback semantics on both sides. Rendering stays behind
//! [`display::ChatView`].

pub mod app;
pub mod backend;
pub mod commands;
pub mod config;
pub mod display;
pub mod export;
pub mod logging;
pub mod models;

pub use app::{ChatApp, SessionState};
pub use backend::{SonarStreamBackend, StreamBackend};
pub use commands::{parse_slash_command, SearchCommand, SlashCommand};
pub use config::AppConfig;
pub use display::{ChatView, ConsoleView};
