//! Transport seam
//!
//! The throttle queue hands released requests to a [`Transport`], which
//! performs the network call and yields a status code and body.
//! [`ReqwestTransport`] is the default implementation.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{Method, StringMap};
use futures::future::BoxFuture;
use reqwest::Client;
use std::time::Duration;

/// Request handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Fully qualified URI
    pub uri: String,
    /// Form-encoded body
    pub form: Option<StringMap>,
    /// Value of the `token` query parameter
    pub token: Option<String>,
}

/// Raw response produced by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, unparsed
    pub body: String,
}

impl TransportResponse {
    /// Create a new response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs network calls for released requests
///
/// `send` is called synchronously, in release order, while the throttle
/// state is locked. It must not block; all I/O belongs in the returned
/// future, which is polled on a spawned task.
pub trait Transport: Send + Sync {
    /// Start sending a request
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportResponse>>;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default reqwest client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport from an existing reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Create a transport using the timeout and user agent from `config`
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportResponse>> {
        let mut req = self.client.request(request.method.into(), &request.uri);

        if let Some(ref form) = request.form {
            req = req.form(form);
        }

        if let Some(ref token) = request.token {
            req = req.query(&[("token", token)]);
        }

        Box::pin(async move {
            let response = req.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, Error>(TransportResponse { status, body })
        })
    }
}
