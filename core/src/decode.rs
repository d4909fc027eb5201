//! Response body decoding.

use std::any::Any;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// Maps raw response bytes to a typed value.
pub trait Decoder: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error>;
}

/// Decodes JSON bodies with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    type Error = serde_json::Error;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Target type for responses without a meaningful body.
///
/// Decoding into `Empty` never looks at the bytes and never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty;

/// Decode `bytes` into `T` with `decoder`.
///
/// `Empty` short-circuits without calling the decoder. Any other failure is
/// returned as `HttpError::BadResponse`.
pub fn decode<T, D>(decoder: &D, bytes: &[u8]) -> Result<T, HttpError>
where
    T: DeserializeOwned + 'static,
    D: Decoder,
{
    if let Some(empty) = empty_as::<T>() {
        return Ok(empty);
    }
    decoder
        .decode(bytes)
        .map_err(|e| HttpError::BadResponse(Box::new(e)))
}

fn empty_as<T: 'static>() -> Option<T> {
    let mut slot = Some(Empty);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<T>>()
        .and_then(Option::take)
}
