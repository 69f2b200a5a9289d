//! Request descriptors and response handles
//!
//! A [`RequestDescriptor`] is the normalized form of one outbound call while
//! it waits in the throttle queue. It owns the sending half of a oneshot
//! channel; the caller holds the receiving half as a [`ResponseHandle`].

use super::transport::TransportRequest;
use crate::error::{Error, Result};
use crate::types::{Method, StringMap};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// One outbound HTTP call awaiting dispatch
pub struct RequestDescriptor {
    method: Method,
    uri: String,
    form: Option<StringMap>,
    token: Option<String>,
    responder: Responder,
}

impl RequestDescriptor {
    /// Build a descriptor and the handle its result will be delivered to
    ///
    /// `form` is dropped for verbs that do not carry a body.
    pub fn new(
        method: Method,
        uri: impl Into<String>,
        form: Option<StringMap>,
        token: Option<String>,
    ) -> (Self, ResponseHandle) {
        let (tx, rx) = oneshot::channel();
        let descriptor = Self {
            method,
            uri: uri.into(),
            form: form.filter(|_| method.accepts_body()),
            token,
            responder: Responder { tx },
        };
        (descriptor, ResponseHandle { rx })
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Fully qualified URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Form body, if any
    pub fn form(&self) -> Option<&StringMap> {
        self.form.as_ref()
    }

    /// Auth token captured when the descriptor was built
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Settle the handle with an error without dispatching
    pub(crate) fn fail(self, error: Error) {
        self.responder.settle(Err(error));
    }

    /// Split into the transport request and the responder
    pub(crate) fn into_parts(self) -> (TransportRequest, Responder) {
        let request = TransportRequest {
            method: self.method,
            uri: self.uri,
            form: self.form,
            token: self.token,
        };
        (request, self.responder)
    }
}

impl std::fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("form", &self.form)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Write-once sender for a request's outcome
#[derive(Debug)]
pub(crate) struct Responder {
    tx: oneshot::Sender<Result<String>>,
}

impl Responder {
    /// Deliver the outcome. Consumes the responder, so it can only happen once.
    pub(crate) fn settle(self, result: Result<String>) {
        // The caller may have dropped its handle; the request still counts.
        let _ = self.tx.send(result);
    }
}

/// Single-settlement result of one request
///
/// Resolves to the raw response body on success. If the request is dropped
/// without ever being settled the handle resolves to [`Error::Abandoned`].
#[derive(Debug)]
#[must_use = "a ResponseHandle does nothing unless awaited"]
pub struct ResponseHandle {
    rx: oneshot::Receiver<Result<String>>,
}

impl Future for ResponseHandle {
    type Output = Result<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::Abandoned)))
    }
}
