// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # throttled-api
//!
//! A verb-based HTTP API client whose requests pass through a
//! sliding-window rate-limited dispatch queue.
//!
//! ## Features
//!
//! - **Verb API**: `get`, `post`, `put`, `delete` against a configured endpoint
//! - **Query Token Auth**: optional `token` query parameter on every request
//! - **Sliding Window Throttle**: at most N requests leave per rolling window
//! - **FIFO Dispatch**: requests are released strictly in submission order
//! - **Error Log**: failed requests are appended to a log before they settle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use throttled_api::{ApiClient, ApiConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ApiConfig::builder()
//!         .endpoint("https://api.example.com")
//!         .token("ABC")
//!         .throttle(600, 600)
//!         .build();
//!     let client = ApiClient::from_config(&config)?;
//!
//!     let body = client.get("/campaigns").await?;
//!     println!("{body}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   descriptor   ┌──────────────────┐   release   ┌───────────┐
//! │  ApiClient   │ ─────────────▶ │  ThrottleQueue   │ ──────────▶ │ Transport │
//! │ get/post/... │                │ window log + FIFO│             │ (reqwest) │
//! └──────┬───────┘                └────────┬─────────┘             └─────┬─────┘
//!        │ ResponseHandle                  │ tick (1s)                   │
//!        ◀─────────────────────────────────┴──── settle ◀── ErrorLog ◀───┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client and throttle configuration
pub mod config;

/// Best-effort error log sinks
pub mod error_log;

/// Verb client, throttle queue and transport
pub mod http;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ApiConfig, ThrottleConfig};
pub use error::{Error, Result};
pub use error_log::{ErrorLog, FileErrorLog, TracingErrorLog};
pub use http::{ApiClient, ResponseHandle, ThrottleQueue, Transport};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
