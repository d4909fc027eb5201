//! Convenience layer over an HTTP stack and a structured logging facade.
//!
//! # Overview
//! - `client`: an HTTP client wrapper that builds a request, merges default
//!   headers, hands the request to a `Transport` and decodes the body. Both
//!   async and callback-style entry points are offered.
//! - `log`: a leveled logger that fans records out to caller-supplied
//!   destinations through a serial queue, with named children that share
//!   their parent's gate.
//!
//! # Design
//! - Requests and responses are plain data (`http`); the networking itself
//!   lives behind `Transport`, with `UreqTransport` as the default.
//! - Headers, query strings and form bodies share one ordered container,
//!   `HttpParameters`, keyed by a typed `ParameterKey`.
//! - Nothing here retries, caches, pools connections or formats log output.

pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod log;
pub mod params;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use config::{ClientConfig, LoggerConfig};
pub use decode::{decode, Decoder, Empty, JsonDecoder};
pub use error::{BoxError, HttpError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpResult, RawResponse, ResponseMetadata};
pub use params::{HeaderName, HttpHeaders, HttpParameters, ParameterKey, QueryParameters};
pub use transport::{Transport, TransportFuture, UreqTransport};
