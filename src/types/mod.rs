//! Microsoft Graph resource models.
//!
//! Field names follow Graph's camelCase JSON so values pass through to
//! callers unchanged.

use serde::{Deserialize, Deserializer};

pub mod application;
pub mod auth_method;
pub mod device;
pub mod group;
pub mod logs;
pub mod permission;
pub mod policy;
pub mod user;

pub use application::*;
pub use auth_method::*;
pub use device::*;
pub use group::*;
pub use logs::*;
pub use permission::*;
pub use policy::*;
pub use user::*;

/// Treat an explicit `null` like a missing field. Graph sends both.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
