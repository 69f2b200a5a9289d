//! Rate-limited dispatch queue
//!
//! [`ThrottleQueue`] buffers [`RequestDescriptor`]s in arrival order and
//! releases them to a [`Transport`] only while the sliding window has
//! capacity. A ticker task ages the window once per second and retries the
//! drain, so blocked requests go out as soon as older usage expires.

use super::descriptor::{RequestDescriptor, Responder};
use super::rate_limit::ThrottleState;
use super::transport::{Transport, TransportResponse};
use crate::config::ThrottleConfig;
use crate::error::{Error, Result};
use crate::error_log::ErrorLog;
use crate::types::Method;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, trace, warn};

/// Period of the window ticker
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Point-in-time view of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSnapshot {
    /// Requests waiting for capacity
    pub pending: usize,
    /// Requests released within the current window
    pub window_usage: usize,
    /// Request ceiling per window
    pub max_requests: usize,
    /// Window length in seconds
    pub window_seconds: usize,
}

/// Sliding-window throttled queue in front of a transport
///
/// Must be created inside a Tokio runtime; the ticker and completion tasks
/// are spawned on that runtime. Dropping the queue stops its ticker.
pub struct ThrottleQueue {
    shared: Arc<Shared>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    state: Mutex<ThrottleState<RequestDescriptor>>,
    transport: Arc<dyn Transport>,
    error_log: Arc<dyn ErrorLog>,
    runtime: Handle,
}

impl ThrottleQueue {
    /// Create a queue and start its ticker on the current runtime
    pub fn new(
        config: &ThrottleConfig,
        transport: Arc<dyn Transport>,
        error_log: Arc<dyn ErrorLog>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::runtime(e.to_string()))?;

        let shared = Arc::new(Shared {
            state: Mutex::new(ThrottleState::new(config)),
            transport,
            error_log,
            runtime,
        });
        let ticker = spawn_ticker(&shared);

        info!(
            "Throttle queue started: {} requests per {}s",
            config.max_requests(),
            config.window_seconds()
        );

        Ok(Self {
            shared,
            ticker: Mutex::new(Some(ticker)),
        })
    }

    /// Append a descriptor and release whatever the window allows
    pub fn enqueue(&self, descriptor: RequestDescriptor) {
        debug!("Enqueued {} {}", descriptor.method(), descriptor.uri());
        self.shared.lock_state().push(descriptor);
        self.shared.drain();
    }

    /// Release pending descriptors while capacity remains
    pub fn drain(&self) {
        self.shared.drain();
    }

    /// Age the window by one second, then drain
    pub fn tick(&self) {
        self.shared.tick();
    }

    /// Restart with new limits
    ///
    /// The window is replaced with an all-zero log and the ticker restarted.
    /// Descriptors still pending stay queued in their original order and are
    /// released under the new limits.
    pub fn reset(&self, config: &ThrottleConfig) {
        {
            let mut ticker = lock(&self.ticker);
            if let Some(handle) = ticker.take() {
                handle.abort();
            }
            self.shared.lock_state().reset(config);
            *ticker = Some(spawn_ticker(&self.shared));
        }

        info!(
            "Throttle queue reset: {} requests per {}s",
            config.max_requests(),
            config.window_seconds()
        );
        self.shared.drain();
    }

    /// Current queue and window figures
    pub fn snapshot(&self) -> ThrottleSnapshot {
        let state = self.shared.lock_state();
        ThrottleSnapshot {
            pending: state.pending_len(),
            window_usage: state.window_usage(),
            max_requests: state.max_requests(),
            window_seconds: state.log().window_seconds(),
        }
    }
}

impl Drop for ThrottleQueue {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.ticker).take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for ThrottleQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottleQueue")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, ThrottleState<RequestDescriptor>> {
        lock(&self.state)
    }

    fn drain(&self) {
        // Hand-off happens under the lock so transport calls start in FIFO order
        let mut state = self.lock_state();
        let released = state.drain_with(|descriptor| self.release(descriptor));
        if released > 0 {
            debug!(
                "Released {} request(s), window usage {}/{}, {} pending",
                released,
                state.window_usage(),
                state.max_requests(),
                state.pending_len()
            );
        }
    }

    fn tick(&self) {
        {
            let mut state = self.lock_state();
            state.advance();
            trace!(
                "Tick: window usage {}/{}, {} pending",
                state.window_usage(),
                state.max_requests(),
                state.pending_len()
            );
        }
        self.drain();
    }

    fn release(&self, descriptor: RequestDescriptor) {
        let (request, responder) = descriptor.into_parts();
        let method = request.method;
        let uri = request.uri.clone();
        let response = self.transport.send(request);
        let error_log = Arc::clone(&self.error_log);

        self.runtime
            .spawn(complete(method, uri, response, responder, error_log));
    }
}

fn spawn_ticker(shared: &Arc<Shared>) -> JoinHandle<()> {
    let weak: Weak<Shared> = Arc::downgrade(shared);
    shared.runtime.spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        loop {
            interval.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            shared.tick();
        }
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Await the transport, then settle the caller's handle
///
/// Failures are written to the error log before the handle settles.
async fn complete(
    method: Method,
    uri: String,
    response: BoxFuture<'static, Result<TransportResponse>>,
    responder: Responder,
    error_log: Arc<dyn ErrorLog>,
) {
    let outcome = interpret(method, &uri, response.await);
    if let Err(ref e) = outcome {
        warn!("Request failed: {e}");
        error_log.append(&e.to_string()).await;
    } else {
        debug!("Request succeeded: {method} {uri}");
    }
    responder.settle(outcome);
}

/// Map a transport result to the caller-visible outcome
///
/// Any status up to and including 206 is a success carrying the raw body.
pub(crate) fn interpret(
    method: Method,
    uri: &str,
    result: Result<TransportResponse>,
) -> Result<String> {
    let response = result?;
    if response.status <= 206 {
        Ok(response.body)
    } else {
        Err(Error::unexpected_status(
            method,
            uri,
            response.status,
            response.body,
        ))
    }
}
