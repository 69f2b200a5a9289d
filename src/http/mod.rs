//! HTTP dispatch module
//!
//! Provides the verb-based client and the rate-limited queue behind it.
//!
//! # Features
//!
//! - **Verb API**: `get`, `post`, `put`, `delete` against a base endpoint
//! - **Sliding Window**: at most N requests released per rolling window
//! - **FIFO Dispatch**: requests leave in submission order
//! - **Pluggable Transport**: reqwest by default, any [`Transport`] in tests

mod client;
mod descriptor;
mod queue;
mod rate_limit;
mod transport;

pub use client::ApiClient;
pub use descriptor::{RequestDescriptor, ResponseHandle};
pub use queue::{ThrottleQueue, ThrottleSnapshot, TICK_PERIOD};
pub use rate_limit::{SlidingWindowLog, ThrottleState};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
