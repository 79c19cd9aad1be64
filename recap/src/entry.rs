//! Stored-entry serialization.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response, StatusCode, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to encode or decode a stored entry.
///
/// Decode failures are treated as a cache miss by the transport; the blob is
/// simply discarded.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The entry could not be encoded.
    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),
    /// The blob is not a valid entry.
    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),
    /// The blob carried a status code outside the valid range.
    #[error(transparent)]
    Status(#[from] http::status::InvalidStatusCode),
}

/// A response in its storable form: status line, headers and the complete
/// body. Round-trips through [`encode`](Self::encode)/[`decode`](Self::decode);
/// backends only ever see the opaque blob.
#[derive(Clone, Debug)]
pub struct StoredResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

/// On-the-wire shape of an entry. Headers travel as name/value byte pairs so
/// the encoding stays independent of `http`'s internals; pairs that fail to
/// parse on the way back are dropped.
#[derive(Serialize, Deserialize)]
struct WireResponse {
    status: u16,
    version: String,
    headers: Vec<(String, Vec<u8>)>,
    body: Bytes,
}

impl StoredResponse {
    /// Builds an entry from response pieces.
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap, body: Bytes) -> Self {
        StoredResponse {
            status,
            version,
            headers,
            body,
        }
    }

    /// Builds an entry from a buffered response.
    pub fn from_response(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        StoredResponse {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }

    /// Reconstructs the response this entry was built from.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.version_mut() = self.version;
        *response.headers_mut() = self.headers;
        response
    }

    /// Encodes the entry into its storable blob.
    pub fn encode(&self) -> Result<Bytes, EntryError> {
        let wire = WireResponse {
            status: self.status.as_u16(),
            version: format!("{:?}", self.version),
            headers: self
                .headers
                .iter()
                .map(|(name, value)| (name.as_str().to_owned(), value.as_bytes().to_vec()))
                .collect(),
            body: self.body.clone(),
        };
        let encoded = bincode::serde::encode_to_vec(&wire, bincode::config::standard())?;
        Ok(Bytes::from(encoded))
    }

    /// Decodes a blob produced by [`encode`](Self::encode).
    pub fn decode(raw: &[u8]) -> Result<Self, EntryError> {
        let (wire, _): (WireResponse, usize) =
            bincode::serde::decode_from_slice(raw, bincode::config::standard())?;
        let mut headers = HeaderMap::new();
        for (name, value) in wire.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(&value),
            ) {
                headers.append(name, value);
            }
        }
        Ok(StoredResponse {
            status: StatusCode::from_u16(wire.status)?,
            version: parse_version(&wire.version),
            headers,
            body: wire.body,
        })
    }
}

fn parse_version(value: &str) -> Version {
    match value {
        "HTTP/0.9" => Version::HTTP_09,
        "HTTP/1.0" => Version::HTTP_10,
        "HTTP/2.0" => Version::HTTP_2,
        "HTTP/3.0" => Version::HTTP_3,
        _ => Version::HTTP_11,
    }
}
