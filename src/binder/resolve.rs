//! @acp:module "Resolution"
//! @acp:summary "Key-to-value resolution shared by the direct and interactive binders"
//! @acp:domain cli
//! @acp:layer logic
//!
//! Both binders end with a list of keys per parameter (argv tokens or prompt
//! answers). [`resolve_param`] is the only place those keys become values, so
//! the two modes cannot drift apart.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{CliError, Result};
use crate::model::{Choice, Param};

/// @acp:summary "Resolve one parameter's supplied keys to its final value"
///
/// - no keys supplied: the declared defaults are used
/// - `multiple`: always an array, possibly empty
/// - scalar: the first key's value, or `None` when there is nothing to resolve
/// - keys map to `Choice.value`; without choices they pass through as strings
pub fn resolve_param(
    param: &Param,
    supplied: Option<Vec<String>>,
    choices: Option<&[Choice]>,
) -> Result<Option<Value>> {
    let keys = match supplied {
        Some(keys) if !keys.is_empty() => keys,
        _ => param.default_keys().to_vec(),
    };

    if param.is_multiple() {
        let values = keys
            .iter()
            .map(|key| lookup(param, choices, key))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Some(Value::Array(values)));
    }

    keys.first()
        .map(|key| lookup(param, choices, key))
        .transpose()
}

fn lookup(param: &Param, choices: Option<&[Choice]>, key: &str) -> Result<Value> {
    let Some(choices) = choices else {
        return Ok(Value::String(key.to_string()));
    };

    choices
        .iter()
        .find(|choice| choice.key == key)
        .map(|choice| choice.value.clone())
        .ok_or_else(|| {
            CliError::config(format!(
                "`{key}` is not a choice of `{}` (available: {})",
                param.name(),
                choices
                    .iter()
                    .map(|choice| choice.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// @acp:summary "Flat name-to-value object handed to an action"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedData {
    values: Map<String, Value>,
}

impl ResolvedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge argument values, then option values. On a name collision the
    /// option's value wins; node construction already rejects such overlaps.
    pub fn merge(arguments: Map<String, Value>, options: Map<String, Value>) -> Self {
        let mut values = arguments;
        values.extend(options);
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserialize one field; `Ok(None)` when absent
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.values
            .get(name)
            .map(|value| serde_json::from_value(value.clone()))
            .transpose()
            .map_err(CliError::from)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for ResolvedData {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}
