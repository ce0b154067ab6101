//! Live form state and snapshot capture

use crate::snapshot::FormSnapshot;
use parking_lot::RwLock;
use std::sync::Arc;

/// Anything a snapshot can be captured from at trigger time
pub trait FormSource: Send + Sync {
    /// Read every current field value
    ///
    /// Called synchronously when a trigger fires, never when a response
    /// arrives, so the snapshot describes the input that caused the request.
    fn capture_snapshot(&self) -> FormSnapshot;
}

/// Shared, editable set of named form fields
///
/// Clones share the same underlying fields.
#[derive(Debug, Clone, Default)]
pub struct LiveForm {
    fields: Arc<RwLock<Vec<(String, String)>>>,
}

impl LiveForm {
    /// Create an empty form
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a form seeded with initial field values
    pub fn with_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let form = Self::new();
        for (name, value) in fields {
            form.set(name, value);
        }
        form
    }

    /// Set a field, keeping its position if it already exists
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut fields = self.fields.write();
        match fields.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name, value)),
        }
    }

    /// Remove a field, returning its last value
    pub fn remove(&self, name: &str) -> Option<String> {
        let mut fields = self.fields.write();
        let idx = fields.iter().position(|(field, _)| field == name)?;
        Some(fields.remove(idx).1)
    }

    /// Current value of a field
    pub fn get(&self, name: &str) -> Option<String> {
        self.fields
            .read()
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.clone())
    }
}

impl FormSource for LiveForm {
    fn capture_snapshot(&self) -> FormSnapshot {
        let fields = self.fields.read();
        FormSnapshot::from_pairs(fields.iter().cloned())
    }
}
