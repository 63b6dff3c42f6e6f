//! Wire types exchanged with the backend.

use serde::Deserialize;

mod categories;
mod classification;
mod item;
mod thread;

pub use categories::{CategoryItem, SmartBucket, SmartCategories};
pub use classification::ClassificationResult;
pub use item::{InboundItem, ParsedEnvelope, Platform, PriorityTotals, UnifiedInbox};
pub use thread::{BrandRef, DealThread, ThreadEmail};

pub(crate) use categories::CategoriesEnvelope;
pub(crate) use classification::ClassificationPayload;
pub(crate) use thread::{ThreadEnvelope, ThreadListEnvelope};

/// Deserializes a field, reading an explicit `null` as the type's default.
///
/// Use together with `#[serde(default)]` so a missing key is covered too.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes an identifier that the backend may send as a string or a number.
pub(crate) mod opaque_id {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
            RawId::Float(n) => n.to_string(),
        })
    }

    #[allow(clippy::ptr_arg)] // Required by serde with= signature
    pub fn serialize<S>(id: &String, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }
}
