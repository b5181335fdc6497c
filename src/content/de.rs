//! Deserialization helpers for CMS fields

use serde::{Deserialize, Deserializer};

/// Read `null` as the type's default; the CMS sends `null` for empty fields
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
