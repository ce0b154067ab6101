//! Immutable capture of form field values

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// Field carrying the artifact background/border color
pub const BACKGROUND_FIELD: &str = "background";

/// Field naming the surface function
pub const FUNC_FIELD: &str = "func";

/// An ordered, immutable mapping of form field names to values
///
/// Field names are unique; inserting an existing name while building replaces
/// its value in place, so the original field order is kept. Cloning is cheap,
/// the fields are shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormSnapshot {
    fields: Arc<[(String, String)]>,
}

impl FormSnapshot {
    /// Start building a snapshot
    pub fn builder() -> FormSnapshotBuilder {
        FormSnapshotBuilder::default()
    }

    /// Build a snapshot from `(name, value)` pairs, later duplicates win
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut builder = Self::builder();
        for (name, value) in pairs {
            builder = builder.field(name, value);
        }
        builder.build()
    }

    /// Value of a field, if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the snapshot contains a field
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Fields in form order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `background` field
    pub fn background(&self) -> Option<&str> {
        self.get(BACKGROUND_FIELD)
    }

    /// The `func` field
    pub fn func(&self) -> Option<&str> {
        self.get(FUNC_FIELD)
    }
}

impl Serialize for FormSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.fields.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Builder for [`FormSnapshot`]
#[derive(Debug, Default)]
pub struct FormSnapshotBuilder {
    fields: Vec<(String, String)>,
}

impl FormSnapshotBuilder {
    /// Add or replace a field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    /// Freeze the fields into a snapshot
    pub fn build(self) -> FormSnapshot {
        FormSnapshot {
            fields: self.fields.into(),
        }
    }
}
