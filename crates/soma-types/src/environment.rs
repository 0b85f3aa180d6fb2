//! Creation environment for components.
//!
//! An [`Environment`] is a flat key/value parameter map captured at
//! component creation. It contributes to identity derivation through its
//! [`fingerprint`](Environment::fingerprint) and is carried by the component
//! for the rest of its life as creation context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flat key/value creation context.
///
/// Parameters are stored in a sorted map so the fingerprint is
/// deterministic regardless of insertion order.
///
/// # Example
///
/// ```
/// use soma_types::Environment;
///
/// let mut env = Environment::new();
/// env.set("region", "eu-west-1");
/// env.set("tier", "staging");
///
/// assert_eq!(env.get("tier"), Some("staging"));
/// assert!(env.fingerprint().contains("region=eu-west-1"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Random per-instance identifier, part of the identity digest input.
    id: Uuid,
    created_at: DateTime<Utc>,
    parameters: BTreeMap<String, String>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            parameters: BTreeMap::new(),
        }
    }

    /// Creates an environment from an existing parameter map.
    #[must_use]
    pub fn from_parameters<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = Self::new();
        for (k, v) in parameters {
            env.parameters.insert(k.into(), v.into());
        }
        env
    }

    /// Returns the environment's instance identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the environment creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sets a parameter, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Iterates over parameter keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns `true` if the environment has no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Returns a deterministic serialized form used as digest input.
    ///
    /// Format: `env:<uuid>;key=value;key=value` with keys in sorted order.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut out = format!("env:{}", self.id);
        for (k, v) in &self.parameters {
            out.push(';');
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
