//! Named numeric bounds for comparison resolution.
//!
//! Rule conditions may compare a measure against a symbolic name instead of
//! a literal (`{UserAge} < legalAge`). The translator resolves such names
//! through a [`BoundEnv`] passed in explicitly, layered from three sources:
//! the built-in defaults, `constant` declarations in the rule document, and
//! caller-provided values (programmatic or a flat JSON object file).

use crate::error::{Error, TranslateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Immutable-once-built mapping from symbolic bound names to values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundEnv {
    bounds: BTreeMap<String, i64>,
}

impl Default for BoundEnv {
    /// The stand-in age threshold is the one pre-seeded bound.
    fn default() -> Self {
        Self::empty().with_bound("legalAge", 18)
    }
}

impl BoundEnv {
    pub fn empty() -> Self {
        Self {
            bounds: BTreeMap::new(),
        }
    }

    /// Add or replace one bound.
    #[must_use]
    pub fn with_bound(mut self, name: impl Into<String>, value: i64) -> Self {
        self.bounds.insert(name.into(), value);
        self
    }

    /// Layer other definitions over this environment; later wins.
    #[must_use]
    pub fn with_constants(mut self, constants: &BTreeMap<String, i64>) -> Self {
        for (name, value) in constants {
            self.bounds.insert(name.clone(), *value);
        }
        self
    }

    /// Load bounds from a flat JSON object (`{"legalAge": 18}`), layered
    /// over this environment.
    pub fn with_json_str(self, json: &str) -> Result<Self, Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let obj = value
            .as_object()
            .ok_or_else(|| TranslateError::NonObjectBounds {
                found: value.to_string(),
            })?;

        let mut env = self;
        for (name, value) in obj {
            let value = value
                .as_i64()
                .ok_or_else(|| TranslateError::NonIntegerBound {
                    name: name.clone(),
                    found: value.to_string(),
                })?;
            env.bounds.insert(name.clone(), value);
        }
        Ok(env)
    }

    /// Load bounds from a JSON file, layered over this environment.
    pub fn with_json_file(self, path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        self.with_json_str(&content)
    }

    pub fn resolve(&self, name: &str) -> Option<i64> {
        self.bounds.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seeds_age_threshold() {
        assert_eq!(BoundEnv::default().resolve("legalAge"), Some(18));
        assert_eq!(BoundEnv::default().resolve("other"), None);
    }

    #[test]
    fn layering_order_later_wins() {
        let constants = BTreeMap::from([("legalAge".to_string(), 21)]);
        let env = BoundEnv::default().with_constants(&constants);
        assert_eq!(env.resolve("legalAge"), Some(21));
    }

    #[test]
    fn json_object_loads() {
        let env = BoundEnv::empty()
            .with_json_str(r#"{"stateThreshold": 7, "legalAge": 16}"#)
            .unwrap();
        assert_eq!(env.resolve("stateThreshold"), Some(7));
        assert_eq!(env.resolve("legalAge"), Some(16));
    }

    #[test]
    fn json_non_object_rejected() {
        let err = BoundEnv::empty().with_json_str("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn json_non_integer_rejected() {
        let err = BoundEnv::empty()
            .with_json_str(r#"{"x": "young"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("integer"));
    }
}
