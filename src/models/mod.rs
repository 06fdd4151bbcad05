//! Domain records and their create/patch inputs.

pub mod appointment;
pub mod encounter;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod timestamp;
pub mod user;

pub use appointment::*;
pub use encounter::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field from an explicit `null` in patch bodies.
///
/// Used with `#[serde(default, deserialize_with = "deserialize_some")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
