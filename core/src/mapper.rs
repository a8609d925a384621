//! Turning raw JSON into typed entities.
//!
//! # Design
//! An entity is a serde type with a `Default` "empty" instance. The default
//! mapper starts from that instance and deep-merges the server's JSON onto
//! it, so fields the server does not send keep their local values. Saving
//! merges the server response onto the caller's own instance the same way.
//!
//! The merge goes through `serde_json::Value`, so fields the server never
//! sees (`#[serde(skip)]`) are rebuilt from their default. `Entity::preserve`
//! receives the instance as it was before the merge and copies such fields
//! back.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// A domain record backed by a REST resource.
pub trait Entity: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    type Id: fmt::Display;

    /// The server-side identifier, `None` until the entity has been created.
    fn id(&self) -> Option<&Self::Id>;

    fn clear_id(&mut self);

    /// Deep-merge `json` onto this instance.
    fn merge(&mut self, json: Value) -> Result<(), ApiError> {
        let mut base =
            serde_json::to_value(&*self).map_err(|e| ApiError::Serialization(e.to_string()))?;
        merge_json(&mut base, json);
        let merged: Self = serde_json::from_value(base)?;
        let previous = std::mem::replace(self, merged);
        self.preserve(previous);
        Ok(())
    }

    /// Called after a merge with the instance as it was before. Copy back
    /// any local state that does not serialize.
    fn preserve(&mut self, _previous: Self) {}
}

/// The identifier rendered for use in a path, if set and non-empty.
pub(crate) fn path_id<T: Entity>(entity: &T) -> Option<String> {
    entity
        .id()
        .map(ToString::to_string)
        .filter(|id| !id.is_empty())
}

/// Converts raw JSON into a `T`.
pub type Mapper<T> = Arc<dyn Fn(Value) -> Result<T, ApiError> + Send + Sync>;

pub fn default_mapper<T: Entity>() -> Mapper<T> {
    Arc::new(make_instance::<T>)
}

/// Create `T::default()` and merge `json` onto it.
pub fn make_instance<T: Entity>(json: Value) -> Result<T, ApiError> {
    let mut instance = T::default();
    instance.merge(json)?;
    Ok(instance)
}

/// Recursively merge `source` into `target`.
///
/// Objects merge key by key and arrays index by index; any other source
/// value, `null` included, replaces the target.
pub fn merge_json(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (index, value) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(slot) => merge_json(slot, value),
                    None => target.push(value),
                }
            }
        }
        (target, source) => *target = source,
    }
}
