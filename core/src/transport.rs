//! The seam between the client and the networking stack.
//!
//! # Design
//! The client never opens sockets itself. A `Transport` takes a finished
//! `HttpRequest` and hands back a `RawResponse`; connection reuse, TLS,
//! redirects and timeouts all belong to the transport. `UreqTransport` is the
//! default and runs the blocking `ureq` agent on tokio's blocking pool, so it
//! must be polled from inside a tokio runtime; elsewhere it fails with the
//! `TryCurrentError` as its error.

use std::future::Future;
use std::pin::Pin;

use crate::config::ClientConfig;
use crate::error::BoxError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RawResponse};
use crate::params::{HttpHeaders, ParameterKey};

/// Future returned by `Transport::execute`.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse, BoxError>> + Send + 'a>>;

/// Executes requests against a networking stack.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Transport backed by a `ureq::Agent`.
///
/// Non-2xx statuses are returned as responses, not errors, so status
/// interpretation stays with the caller.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        Self { agent }
    }

    /// Wrap an agent configured by the caller.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => return Box::pin(async move { Err(Box::new(e) as BoxError) }),
        };
        let agent = self.agent.clone();
        Box::pin(async move {
            let response = handle.spawn_blocking(move || perform(&agent, request)).await??;
            Ok::<_, BoxError>(RawResponse::Http(response))
        })
    }
}

fn perform(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, ureq::Error> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;
    if body.is_some() && !method.sends_body() {
        tracing::debug!(%method, %url, "request body dropped for method without body");
    }
    let body = body.unwrap_or_default();

    let mut response = match method {
        HttpMethod::Get => apply_headers(agent.get(url.as_str()), &headers).call(),
        HttpMethod::Delete => apply_headers(agent.delete(url.as_str()), &headers).call(),
        HttpMethod::Head => apply_headers(agent.head(url.as_str()), &headers).call(),
        HttpMethod::Post => apply_headers(agent.post(url.as_str()), &headers).send(&body[..]),
        HttpMethod::Put => apply_headers(agent.put(url.as_str()), &headers).send(&body[..]),
        HttpMethod::Patch => apply_headers(agent.patch(url.as_str()), &headers).send(&body[..]),
    }?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_vec()?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn apply_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &HttpHeaders) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name.as_str(), value);
    }
    builder
}
