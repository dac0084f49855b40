//! Serialized bodies carried by the transport.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Opaque JSON-encoded call body.
///
/// Arguments travel from client to server as a `Payload`, and the server's
/// [`WireOutcome`](super::WireOutcome) travels back the same way. Cloning is
/// cheap: the bytes are reference counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    /// Serializes `value` into a new payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(|bytes| Self(Bytes::from(bytes)))
    }

    /// Deserializes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }

    /// Wraps raw bytes without validating them.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the encoded length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Args {
        key: String,
    }

    #[test]
    fn decode_should_reject_bytes_of_the_wrong_shape() {
        let payload = Payload::from_bytes(&b"{\"value\": 1}"[..]);
        assert!(payload.decode::<Args>().is_err());
    }

    #[test]
    fn encode_should_produce_plain_json() {
        let payload = Payload::encode(&Args {
            key: "k".to_string(),
        })
        .unwrap();
        assert_eq!(payload.as_bytes(), b"{\"key\":\"k\"}");
        assert_eq!(payload.len(), 11);
        assert!(!payload.is_empty());
    }
}
