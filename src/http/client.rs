//! Verb-based API client
//!
//! [`ApiClient`] turns `get`/`post`/`put`/`delete` calls into request
//! descriptors and submits them to its throttle queue. Each call returns a
//! [`ResponseHandle`] immediately; the handle settles once the request has
//! been released and answered.

use super::descriptor::{RequestDescriptor, ResponseHandle};
use super::queue::{ThrottleQueue, ThrottleSnapshot};
use super::transport::{ReqwestTransport, Transport};
use crate::config::{ApiConfig, ThrottleConfig};
use crate::error::Result;
use crate::error_log::{ErrorLog, FileErrorLog, TracingErrorLog};
use crate::types::{Method, StringMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::warn;

/// Mutable client settings read when a descriptor or queue is built
#[derive(Debug, Clone, Default)]
struct Settings {
    endpoint: Option<String>,
    token: Option<String>,
    throttle: ThrottleConfig,
}

/// HTTP API client with a sliding-window rate limit
///
/// The throttle queue is created lazily on the first request, from the
/// throttle limits current at that time. Changing the limits afterwards has
/// no effect until [`reset_queue`](Self::reset_queue) is called.
pub struct ApiClient {
    settings: RwLock<Settings>,
    transport: Arc<dyn Transport>,
    error_log: Arc<dyn ErrorLog>,
    queue: Mutex<Option<ThrottleQueue>>,
}

impl ApiClient {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self::with_transport(
            &ApiConfig::default(),
            Arc::new(ReqwestTransport::new()),
            Arc::new(TracingErrorLog),
        )
    }

    /// Create a client from configuration
    ///
    /// Failures are logged to `config.error_log` when set, otherwise only
    /// through `tracing`.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::from_config(config)?);
        let error_log: Arc<dyn ErrorLog> = match &config.error_log {
            Some(path) => Arc::new(FileErrorLog::new(path)),
            None => Arc::new(TracingErrorLog),
        };
        Ok(Self::with_transport(config, transport, error_log))
    }

    /// Create a client with a custom transport and error log
    pub fn with_transport(
        config: &ApiConfig,
        transport: Arc<dyn Transport>,
        error_log: Arc<dyn ErrorLog>,
    ) -> Self {
        Self {
            settings: RwLock::new(Settings {
                endpoint: config.endpoint.clone(),
                token: config.token.clone(),
                throttle: config.throttle,
            }),
            transport,
            error_log,
            queue: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Base endpoint
    pub fn endpoint(&self) -> Option<String> {
        self.read_settings().endpoint.clone()
    }

    /// Set the base endpoint
    pub fn set_endpoint(&self, endpoint: impl Into<String>) {
        self.write_settings().endpoint = Some(endpoint.into());
    }

    /// Auth token
    pub fn token(&self) -> Option<String> {
        self.read_settings().token.clone()
    }

    /// Set the auth token
    ///
    /// Requests already built keep the token they were built with.
    pub fn set_token(&self, token: impl Into<String>) {
        self.write_settings().token = Some(token.into());
    }

    /// Stop sending a token
    pub fn clear_token(&self) {
        self.write_settings().token = None;
    }

    /// Throttle limits
    pub fn throttle(&self) -> ThrottleConfig {
        self.read_settings().throttle
    }

    /// Set throttle limits, applied by the next [`reset_queue`](Self::reset_queue)
    pub fn set_throttle(&self, throttle: ThrottleConfig) {
        self.write_settings().throttle = throttle;
    }

    // ------------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------------

    /// Make a GET request
    pub fn get(&self, path: &str) -> ResponseHandle {
        self.request(Method::GET, path, None)
    }

    /// Make a POST request with optional form data
    pub fn post(&self, path: &str, data: Option<StringMap>) -> ResponseHandle {
        self.request(Method::POST, path, data)
    }

    /// Make a PUT request with optional form data
    pub fn put(&self, path: &str, data: Option<StringMap>) -> ResponseHandle {
        self.request(Method::PUT, path, data)
    }

    /// Make a DELETE request
    pub fn delete(&self, path: &str) -> ResponseHandle {
        self.request(Method::DELETE, path, None)
    }

    /// Build a descriptor for `endpoint + path` and submit it
    ///
    /// Never fails synchronously: if the queue cannot be started the handle
    /// settles with the error.
    pub fn request(&self, method: Method, path: &str, data: Option<StringMap>) -> ResponseHandle {
        let (uri, token) = {
            let settings = self.read_settings();
            let endpoint = settings.endpoint.as_deref().unwrap_or_default();
            (format!("{endpoint}{path}"), settings.token.clone())
        };
        let (descriptor, handle) = RequestDescriptor::new(method, uri, data, token);

        let mut queue = self.lock_queue();
        if queue.is_none() {
            match self.start_queue() {
                Ok(started) => *queue = Some(started),
                Err(e) => {
                    warn!("Cannot dispatch {} {}: {}", method, descriptor.uri(), e);
                    descriptor.fail(e);
                    return handle;
                }
            }
        }
        if let Some(queue) = queue.as_ref() {
            queue.enqueue(descriptor);
        }
        handle
    }

    // ------------------------------------------------------------------------
    // Queue control
    // ------------------------------------------------------------------------

    /// Reinitialize the throttle window from the current throttle limits
    ///
    /// Pending requests are kept and released under the new limits.
    pub fn reset_queue(&self) -> Result<()> {
        let throttle = self.throttle();
        let mut queue = self.lock_queue();
        if let Some(existing) = queue.as_ref() {
            existing.reset(&throttle);
        } else {
            *queue = Some(self.start_queue()?);
        }
        Ok(())
    }

    /// Queue figures, if the queue has been started
    pub fn queue_snapshot(&self) -> Option<ThrottleSnapshot> {
        self.lock_queue().as_ref().map(ThrottleQueue::snapshot)
    }

    fn start_queue(&self) -> Result<ThrottleQueue> {
        ThrottleQueue::new(
            &self.throttle(),
            Arc::clone(&self.transport),
            Arc::clone(&self.error_log),
        )
    }

    fn read_settings(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_settings(&self) -> std::sync::RwLockWriteGuard<'_, Settings> {
        self.settings.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_queue(&self) -> MutexGuard<'_, Option<ThrottleQueue>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.queue_snapshot();
        let settings = self.read_settings();
        f.debug_struct("ApiClient")
            .field("endpoint", &settings.endpoint)
            .field("has_token", &settings.token.is_some())
            .field("throttle", &settings.throttle)
            .field("queue", &queue)
            .finish_non_exhaustive()
    }
}
