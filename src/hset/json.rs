//! JSON and serde support for [`ConcurrentSet`]
//!
//! A set travels as a flat JSON array with no envelope; the reader must
//! know the element type.

use super::ConcurrentSet;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::Hash;

impl<T> ConcurrentSet<T>
where
    T: Eq + Hash + Clone,
{
    /// Encode a snapshot of the items as a JSON array
    pub fn to_json(&self) -> Result<Vec<u8>>
    where
        T: Serialize,
    {
        Ok(serde_json::to_vec(&self.values())?)
    }

    /// Replace the items with those of a JSON array.
    ///
    /// Malformed input returns an error and leaves the set unmodified.
    pub fn from_json(&self, data: &[u8]) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let items: Vec<T> = serde_json::from_slice(data)?;
        self.replace(items);
        Ok(())
    }
}

impl<T> Serialize for ConcurrentSet<T>
where
    T: Eq + Hash + Clone + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.values())
    }
}

impl<'de, T> Deserialize<'de> for ConcurrentSet<T>
where
    T: Eq + Hash + Clone + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}
