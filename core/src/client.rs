//! HTTP client wrapper with async and callback entry points.
//!
//! # Design
//! `HttpClient` is cheap to clone; clones share the transport and the
//! default headers. Every send goes through the same pipeline:
//!
//! 1. run the request-producing closure (failure: `RequestBuild`, nothing sent)
//! 2. merge default headers the request does not already carry
//! 3. execute on the transport (failure: `Transport`, error passed through)
//! 4. reject non-HTTP answers (`BadResponseType`)
//! 5. decode the body (`BadResponse`), unless the target is `Empty`
//!
//! The callback variants run the async pipeline on a spawned task and hand
//! the result to the callback, so both shapes fail the same way.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::decode::{decode, Decoder, JsonDecoder};
use crate::error::{BoxError, HttpError};
use crate::http::{HttpRequest, HttpResult, RawResponse};
use crate::params::{HeaderName, HttpHeaders};
use crate::transport::{Transport, UreqTransport};

/// Builder for `HttpClient`.
pub struct HttpClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            transport: None,
            runtime: None,
        }
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Transport timeout. Ignored when a custom transport is supplied.
    pub fn timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn no_user_agent(mut self) -> Self {
        self.config.user_agent = None;
        self
    }

    /// Add a header sent with every request that does not set it.
    pub fn default_header(mut self, name: impl Into<HeaderName>, value: impl Into<String>) -> Self {
        self.config.default_headers.set(name, value);
        self
    }

    /// Use `transport` instead of the default `UreqTransport`.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Runtime that callback-style calls are spawned on.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> HttpClient {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::from_config(&self.config)),
        };
        HttpClient {
            inner: Arc::new(ClientInner {
                transport,
                default_headers: RwLock::new(self.config.effective_default_headers()),
                runtime: self.runtime,
            }),
        }
    }
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    default_headers: RwLock<HttpHeaders>,
    runtime: Option<Handle>,
}

/// HTTP client wrapper over a `Transport`.
///
/// # Example
///
/// ```ignore
/// use courier_core::{HttpClient, HttpRequest};
///
/// let client = HttpClient::builder()
///     .default_header("accept", "application/json")
///     .build();
///
/// let result = client
///     .send_json::<Item, _, _>(|| Ok::<_, std::convert::Infallible>(HttpRequest::get(url)))
///     .await?;
/// println!("{} -> {:?}", result.status(), result.value());
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Client with the default configuration and a `UreqTransport`.
    pub fn new() -> Self {
        HttpClientBuilder::new().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        HttpClientBuilder::new().config(config).build()
    }

    /// Client with the default configuration over a custom transport.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        HttpClientBuilder::new().transport(transport).build()
    }

    /// Snapshot of the current default headers.
    pub fn default_headers(&self) -> HttpHeaders {
        self.inner.default_headers.read().clone()
    }

    /// Set a default header, replacing any previous value for that name.
    pub fn set_default_header(&self, name: impl Into<HeaderName>, value: impl Into<String>) {
        self.inner.default_headers.write().set(name, value);
    }

    /// Remove a default header. Returns whether one was present.
    pub fn remove_default_header(&self, name: &str) -> bool {
        self.inner.default_headers.write().remove(name) > 0
    }

    /// Send a request and return the raw body.
    ///
    /// With the default `UreqTransport` this must be awaited inside a tokio
    /// runtime; otherwise it fails with `HttpError::Transport`.
    pub async fn send_raw<F, E>(&self, make_request: F) -> Result<HttpResult<Vec<u8>>, HttpError>
    where
        F: FnOnce() -> Result<HttpRequest, E>,
        E: Into<BoxError>,
    {
        let mut request = make_request().map_err(|e| HttpError::RequestBuild(e.into()))?;
        self.apply_default_headers(&mut request);

        let request_id = Uuid::new_v4();
        let method = request.method;
        let url = request.url.clone();
        debug!(%request_id, %method, %url, "sending request");

        let raw = self
            .inner
            .transport
            .execute(request)
            .await
            .map_err(|e| {
                debug!(%request_id, error = %e, "transport error");
                HttpError::Transport(e)
            })?;

        match raw {
            RawResponse::Http(response) => {
                debug!(%request_id, status = response.status, bytes = response.body.len(), "received response");
                Ok(HttpResult::from_response(response))
            }
            RawResponse::Other { url, .. } => {
                warn!(%request_id, %url, "transport returned a non-HTTP response");
                Err(HttpError::BadResponseType)
            }
        }
    }

    /// Send a request and decode the body with `decoder`.
    pub async fn send<T, D, F, E>(&self, make_request: F, decoder: &D) -> Result<HttpResult<T>, HttpError>
    where
        T: DeserializeOwned + 'static,
        D: Decoder,
        F: FnOnce() -> Result<HttpRequest, E>,
        E: Into<BoxError>,
    {
        self.send_raw(make_request)
            .await?
            .try_map(|body| decode(decoder, &body))
    }

    /// Send a request and decode a JSON body.
    pub async fn send_json<T, F, E>(&self, make_request: F) -> Result<HttpResult<T>, HttpError>
    where
        T: DeserializeOwned + 'static,
        F: FnOnce() -> Result<HttpRequest, E>,
        E: Into<BoxError>,
    {
        self.send(make_request, &JsonDecoder).await
    }

    /// Send a request and return the body as UTF-8 text.
    pub async fn send_text<F, E>(&self, make_request: F) -> Result<HttpResult<String>, HttpError>
    where
        F: FnOnce() -> Result<HttpRequest, E>,
        E: Into<BoxError>,
    {
        self.send_raw(make_request)
            .await?
            .try_map(|body| String::from_utf8(body).map_err(|e| HttpError::BadResponse(Box::new(e))))
    }

    /// Send an already built request and return the raw body.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResult<Vec<u8>>, HttpError> {
        self.send_raw(|| Ok::<_, std::convert::Infallible>(request)).await
    }

    /// Callback form of `send_raw`.
    pub fn send_raw_with<F, E, C>(&self, make_request: F, callback: C)
    where
        F: FnOnce() -> Result<HttpRequest, E> + Send + 'static,
        E: Into<BoxError>,
        C: FnOnce(Result<HttpResult<Vec<u8>>, HttpError>) + Send + 'static,
    {
        let client = self.clone();
        self.spawn_bridged(async move { client.send_raw(make_request).await }, callback);
    }

    /// Callback form of `send`.
    pub fn send_with<T, D, F, E, C>(&self, make_request: F, decoder: D, callback: C)
    where
        T: DeserializeOwned + Send + 'static,
        D: Decoder + 'static,
        F: FnOnce() -> Result<HttpRequest, E> + Send + 'static,
        E: Into<BoxError>,
        C: FnOnce(Result<HttpResult<T>, HttpError>) + Send + 'static,
    {
        let client = self.clone();
        self.spawn_bridged(
            async move { client.send(make_request, &decoder).await },
            callback,
        );
    }

    /// Callback form of `send_json`.
    pub fn send_json_with<T, F, E, C>(&self, make_request: F, callback: C)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce() -> Result<HttpRequest, E> + Send + 'static,
        E: Into<BoxError>,
        C: FnOnce(Result<HttpResult<T>, HttpError>) + Send + 'static,
    {
        self.send_with(make_request, JsonDecoder, callback);
    }

    fn apply_default_headers(&self, request: &mut HttpRequest) {
        let defaults = self.inner.default_headers.read();
        request.headers.merge_missing(&defaults);
    }

    /// Run `future` on a task and forward its output to `callback`.
    ///
    /// Uses the configured runtime, then the ambient one, then a dedicated
    /// thread with its own current-thread runtime.
    fn spawn_bridged<T, Fut, C>(&self, future: Fut, callback: C)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, HttpError>> + Send + 'static,
        C: FnOnce(Result<T, HttpError>) + Send + 'static,
    {
        let handle = self
            .inner
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        if let Some(handle) = handle {
            handle.spawn(async move { callback(future.await) });
            return;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "failed to start runtime for callback request");
                callback(Err(HttpError::Transport(Box::new(e))));
                return;
            }
        };
        run_on_thread(runtime, future, callback, |job| {
            std::thread::Builder::new()
                .name("courier-callback".to_string())
                .spawn(job)
                .map(drop)
        });
    }
}

/// Drive `future` on a thread started by `spawn` and pass its output to
/// `callback`. If no thread can be started the callback gets `Transport`.
fn run_on_thread<T, Fut, C, S>(runtime: Runtime, future: Fut, callback: C, spawn: S)
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, HttpError>> + Send + 'static,
    C: FnOnce(Result<T, HttpError>) + Send + 'static,
    S: FnOnce(Box<dyn FnOnce() + Send>) -> std::io::Result<()>,
{
    let (callback_tx, callback_rx) = crossbeam_channel::bounded::<C>(1);
    let job: Box<dyn FnOnce() + Send> = Box::new(move || {
        if let Ok(callback) = callback_rx.recv() {
            callback(runtime.block_on(future));
        }
    });
    match spawn(job) {
        Ok(()) => {
            let _ = callback_tx.send(callback);
        }
        Err(e) => {
            error!(error = %e, "failed to start thread for callback request");
            callback(Err(HttpError::Transport(Box::new(e))));
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("default_headers", &*self.inner.default_headers.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde::Deserialize;

    use super::*;
    use crate::decode::Empty;
    use crate::http::HttpResponse;
    use crate::transport::TransportFuture;

    /// Records requests and answers each with a fixed response.
    #[derive(Clone)]
    struct StubTransport {
        reply: Arc<dyn Fn() -> Result<RawResponse, BoxError> + Send + Sync>,
        seen: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl StubTransport {
        fn new(reply: impl Fn() -> Result<RawResponse, BoxError> + Send + Sync + 'static) -> Self {
            Self {
                reply: Arc::new(reply),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn ok(status: u16, body: &'static [u8]) -> Self {
            Self::new(move || {
                Ok(RawResponse::Http(HttpResponse {
                    status,
                    headers: HttpHeaders::new().with("Content-Type", "application/json"),
                    body: body.to_vec(),
                }))
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().clone()
        }
    }

    impl Transport for StubTransport {
        fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
            self.seen.lock().push(request);
            let reply = (self.reply)();
            Box::pin(async move { reply })
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    fn client(transport: &StubTransport) -> HttpClient {
        HttpClient::builder()
            .no_user_agent()
            .transport(transport.clone())
            .build()
    }

    fn get(url: &str) -> impl FnOnce() -> Result<HttpRequest, std::convert::Infallible> {
        let request = HttpRequest::get(url);
        move || Ok(request)
    }

    #[tokio::test]
    async fn default_headers_fill_gaps_only() {
        let transport = StubTransport::ok(200, b"{}");
        let client = client(&transport);
        client.set_default_header("Authorization", "Bearer default");
        client.set_default_header("Accept", "application/json");

        let request = HttpRequest::get("http://localhost/items").with_header("authorization", "Bearer mine");
        client.execute(request).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.headers.get("Authorization"), Some("Bearer mine"));
        assert_eq!(sent.headers.get_all("authorization").count(), 1);
        assert_eq!(sent.headers.get("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn user_agent_is_a_default_header() {
        let transport = StubTransport::ok(200, b"");
        let client = HttpClient::builder()
            .user_agent("tests/1.0")
            .transport(transport.clone())
            .build();
        client.execute(HttpRequest::get("http://localhost/")).await.unwrap();
        assert_eq!(transport.requests()[0].headers.get("user-agent"), Some("tests/1.0"));
    }

    #[tokio::test]
    async fn default_headers_can_be_removed() {
        let transport = StubTransport::ok(200, b"");
        let client = client(&transport);
        client.set_default_header("X-Trace", "1");
        assert!(client.remove_default_header("x-trace"));
        assert!(!client.remove_default_header("x-trace"));
        client.execute(HttpRequest::get("http://localhost/")).await.unwrap();
        assert!(transport.requests()[0].headers.is_empty());
    }

    #[tokio::test]
    async fn build_failure_sends_nothing() {
        let transport = StubTransport::ok(200, b"{}");
        let client = client(&transport);
        let err = client
            .send_raw(|| Err::<HttpRequest, _>(std::io::Error::other("no url")))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::RequestBuild(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn non_http_response_is_bad_response_type() {
        let transport = StubTransport::new(|| {
            Ok(RawResponse::Other {
                url: "file:///tmp/item.json".to_string(),
                body: br#"{"id":1}"#.to_vec(),
            })
        });
        let err = client(&transport)
            .send_json::<Item, _, _>(get("file:///tmp/item.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BadResponseType));
    }

    #[tokio::test]
    async fn transport_error_passes_through() {
        let transport = StubTransport::new(|| {
            Err(Box::new(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow")) as BoxError)
        });
        let err = client(&transport)
            .send_raw(get("http://localhost/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Transport(_)));
        let io = err.downcast_cause::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn decodes_json_with_metadata() {
        let transport = StubTransport::ok(200, br#"{"id":7}"#);
        let result = client(&transport)
            .send_json::<Item, _, _>(get("http://localhost/items/7"))
            .await
            .unwrap();
        assert_eq!(result.value(), &Item { id: 7 });
        assert_eq!(result.status(), 200);
        assert_eq!(result.headers().get("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn decode_failure_is_bad_response() {
        let transport = StubTransport::ok(200, b"<html>");
        let err = client(&transport)
            .send_json::<Item, _, _>(get("http://localhost/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BadResponse(_)));
    }

    #[tokio::test]
    async fn empty_always_decodes() {
        for body in [&b""[..], &b"<html>"[..]] {
            let transport = StubTransport::ok(204, body);
            let result = client(&transport)
                .send_json::<Empty, _, _>(get("http://localhost/"))
                .await
                .unwrap();
            assert_eq!(result.status(), 204);
        }
    }

    #[tokio::test]
    async fn send_text_rejects_invalid_utf8() {
        let transport = StubTransport::ok(200, &[0xff, 0xfe]);
        let err = client(&transport)
            .send_text(get("http://localhost/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::BadResponse(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_matches_async_result() {
        let transport = StubTransport::ok(200, br#"{"id":3}"#);
        let client = client(&transport);
        let (tx, rx) = tokio::sync::oneshot::channel();
        client.send_json_with::<Item, _, _, _>(get("http://localhost/items/3"), move |result| {
            let _ = tx.send(result);
        });
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.into_value(), Item { id: 3 });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_reports_build_failure() {
        let transport = StubTransport::ok(200, b"{}");
        let client = client(&transport);
        let (tx, rx) = tokio::sync::oneshot::channel();
        client.send_raw_with(
            || Err::<HttpRequest, _>(std::io::Error::other("bad")),
            move |result| {
                let _ = tx.send(result);
            },
        );
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, HttpError::RequestBuild(_)));
        assert!(transport.requests().is_empty());
    }

    /// Run a callback-style send and wait for what the callback receives.
    async fn via_callback<T: Send + 'static>(
        start: impl FnOnce(Box<dyn FnOnce(Result<T, HttpError>) + Send>),
    ) -> Result<T, HttpError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        start(Box::new(move |result| {
            let _ = tx.send(result);
        }));
        rx.await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_reports_bad_response_type() {
        let transport = StubTransport::new(|| {
            Ok(RawResponse::Other {
                url: "file:///tmp/item.json".to_string(),
                body: br#"{"id":1}"#.to_vec(),
            })
        });
        let client = client(&transport);

        let async_err = client.send_raw(get("file:///tmp/item.json")).await.unwrap_err();
        let callback_err = via_callback::<HttpResult<Vec<u8>>>(|cb| {
            client.send_raw_with(get("file:///tmp/item.json"), cb)
        })
        .await
        .unwrap_err();
        assert!(matches!(async_err, HttpError::BadResponseType));
        assert!(matches!(callback_err, HttpError::BadResponseType));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_reports_bad_response() {
        let transport = StubTransport::ok(200, b"<html>");
        let client = client(&transport);

        let async_err = client
            .send::<Item, _, _, _>(get("http://localhost/"), &JsonDecoder)
            .await
            .unwrap_err();
        let callback_err = via_callback::<HttpResult<Item>>(|cb| {
            client.send_with::<Item, _, _, _, _>(get("http://localhost/"), JsonDecoder, cb)
        })
        .await
        .unwrap_err();
        assert!(matches!(async_err, HttpError::BadResponse(_)));
        assert!(matches!(callback_err, HttpError::BadResponse(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_reports_transport_error() {
        let transport = StubTransport::new(|| {
            Err(Box::new(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down")) as BoxError)
        });
        let client = client(&transport);

        let async_err = client.send_raw(get("http://localhost/")).await.unwrap_err();
        let callback_err = via_callback::<HttpResult<Item>>(|cb| {
            client.send_json_with::<Item, _, _, _>(get("http://localhost/"), cb)
        })
        .await
        .unwrap_err();
        for err in [async_err, callback_err] {
            assert!(matches!(err, HttpError::Transport(_)));
            let io = err.downcast_cause::<std::io::Error>().unwrap();
            assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
        }
    }

    #[test]
    fn thread_start_failure_reaches_callback() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        run_on_thread(
            runtime,
            async { Ok::<_, HttpError>(()) },
            move |result| {
                let _ = tx.send(result);
            },
            |_job| Err(std::io::Error::other("no threads left")),
        );
        let err = rx.try_recv().unwrap().unwrap_err();
        assert!(matches!(err, HttpError::Transport(_)));
        assert_eq!(err.downcast_cause::<std::io::Error>().unwrap().to_string(), "no threads left");
    }

    #[test]
    fn callback_without_ambient_runtime() {
        let transport = StubTransport::ok(200, b"payload");
        let client = client(&transport);
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = std::sync::mpsc::channel();
        let counter = calls.clone();
        client.send_raw_with(get("http://localhost/"), move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        });
        let result = rx.recv().unwrap().unwrap();
        assert_eq!(result.value(), b"payload");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
