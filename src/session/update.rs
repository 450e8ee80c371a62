use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Result;

/// Event-type key used to match inbound updates to waiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub Arc<str>);

impl Category {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound event handed to the session by the transport layer.
///
/// The payload is opaque bytes; waiters decode it into whatever type they
/// expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub category: Category,
    pub payload: Bytes,
}

impl Update {
    // ---
    pub fn new(category: impl Into<Category>, payload: impl Into<Bytes>) -> Self {
        Self {
            category: category.into(),
            payload: payload.into(),
        }
    }

    /// Build an update carrying `value` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Serialization` if `value` cannot be serialized.
    pub fn json<T: Serialize>(category: impl Into<Category>, value: &T) -> Result<Self> {
        // ---
        let bytes = serde_json::to_vec(value)?;
        Ok(Self::new(category, bytes))
    }

    /// Deserialize the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Serialization` if the payload does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Photo {
        id: u64,
    }

    #[test]
    fn test_category_serializes_as_plain_string() {
        // ---
        let category = Category::from("photo");
        let json = serde_json::to_string(&category).unwrap();
        assert_eq!(json, "\"photo\"");

        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, category);
    }

    #[test]
    fn test_json_roundtrip_and_bad_payload() {
        // ---
        let update = Update::json("photo", &Photo { id: 7 }).unwrap();
        assert_eq!(update.category.as_str(), "photo");
        assert_eq!(update.decode::<Photo>().unwrap(), Photo { id: 7 });

        let garbage = Update::new("photo", Bytes::from_static(b"not json"));
        assert!(matches!(
            garbage.decode::<Photo>(),
            Err(crate::RpcError::Serialization(_))
        ));
    }
}
