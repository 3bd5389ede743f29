//! Dirty-tracked property bags
//!
//! Properties keep the full current state next to the entries changed since
//! the last [`flush_changes`](Properties::flush_changes). The protocol does not
//! transmit flushed changes anywhere yet; the changed set is kept as local state.

use crate::error::{Result, WebUiError};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    name: String,
    current: HashMap<String, String>,
    changed: HashMap<String, String>,
}

impl Properties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Initial entries count as changed
    pub fn with_initial<K, V>(name: impl Into<String>, initial: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut properties = Self::new(name);
        for (key, value) in initial {
            properties.set(key, value);
        }
        properties
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.current.contains_key(key)
    }

    /// Current keys, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.current.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.current.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Like [`get`](Self::get), but a missing key is a lookup error
    pub fn get_required(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| WebUiError::UnknownProperty(format!("{}.{}", self.name, key)))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.changed.insert(key.clone(), value.clone());
        self.current.insert(key, value);
    }

    /// Entries changed since the previous flush
    pub fn changes(&self) -> &HashMap<String, String> {
        &self.changed
    }

    /// Take the changed entries and start tracking afresh
    pub fn flush_changes(&mut self) -> HashMap<String, String> {
        std::mem::take(&mut self.changed)
    }
}
