//! @acp:module "Choice Registry"
//! @acp:summary "Normalizes candidate value sets into key/value/label triples"
//! @acp:domain cli
//! @acp:layer model
//!
//! A parameter may declare its candidate values as plain strings, as
//! partially-filled objects, or as a closure computing either. Everything is
//! normalized into [`Choice`] before a binder sees it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// @acp:summary "One selectable value of a parameter"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Token typed on the command line and answer stored by prompts
    pub key: String,
    /// Payload substituted for the key after resolution
    pub value: Value,
    /// Display text in interactive lists
    pub label: String,
}

impl Choice {
    /// A choice whose key, value and label are all `key`
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            value: Value::String(key.clone()),
            label: key.clone(),
            key,
        }
    }

    /// A choice with an explicit payload; the label defaults to the key
    pub fn with_value(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        Self {
            value: value.into(),
            label: key.clone(),
            key,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// @acp:summary "A choice as declared, before normalization"
///
/// Deserializes from either a bare string or an object with `key` and
/// optional `value`/`label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceEntry {
    Key(String),
    Item {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl ChoiceEntry {
    pub fn item(key: impl Into<String>, value: impl Into<Value>) -> Self {
        ChoiceEntry::Item {
            key: key.into(),
            value: Some(value.into()),
            label: None,
        }
    }

    /// Expand into a complete [`Choice`]
    pub fn normalize(self) -> Choice {
        match self {
            ChoiceEntry::Key(key) => Choice::new(key),
            ChoiceEntry::Item { key, value, label } => {
                let value = value.unwrap_or_else(|| Value::String(key.clone()));
                let label = label
                    .filter(|label| !label.is_empty())
                    .unwrap_or_else(|| key.clone());
                Choice { key, value, label }
            }
        }
    }
}

impl From<&str> for ChoiceEntry {
    fn from(key: &str) -> Self {
        ChoiceEntry::Key(key.to_string())
    }
}

impl From<String> for ChoiceEntry {
    fn from(key: String) -> Self {
        ChoiceEntry::Key(key)
    }
}

impl From<Choice> for ChoiceEntry {
    fn from(choice: Choice) -> Self {
        ChoiceEntry::Item {
            key: choice.key,
            value: Some(choice.value),
            label: Some(choice.label),
        }
    }
}

/// @acp:summary "Normalize declared entries, preserving order"
pub fn normalize<I, E>(entries: I) -> Vec<Choice>
where
    I: IntoIterator<Item = E>,
    E: Into<ChoiceEntry>,
{
    entries
        .into_iter()
        .map(|entry| entry.into().normalize())
        .collect()
}

/// First key that appears more than once, if any
pub(crate) fn duplicate_key(choices: &[Choice]) -> Option<&str> {
    choices.iter().enumerate().find_map(|(i, choice)| {
        choices[..i]
            .iter()
            .any(|earlier| earlier.key == choice.key)
            .then_some(choice.key.as_str())
    })
}

/// Closure producing a choice set on demand
pub type ChoiceFn = dyn Fn() -> Vec<ChoiceEntry> + Send + Sync;

/// @acp:summary "Where a parameter's choice set comes from"
#[derive(Clone)]
pub enum ChoiceSource {
    /// Declared up front, normalized at construction
    Static(Arc<[Choice]>),
    /// Evaluated lazily, once per invocation, through the binder cache
    Computed(Arc<ChoiceFn>),
}

impl ChoiceSource {
    pub fn fixed<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ChoiceEntry>,
    {
        ChoiceSource::Static(normalize(entries).into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> Vec<ChoiceEntry> + Send + Sync + 'static,
    {
        ChoiceSource::Computed(Arc::new(f))
    }

    pub fn as_static(&self) -> Option<&[Choice]> {
        match self {
            ChoiceSource::Static(choices) => Some(choices),
            ChoiceSource::Computed(_) => None,
        }
    }
}

impl fmt::Debug for ChoiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceSource::Static(choices) => f.debug_tuple("Static").field(choices).finish(),
            ChoiceSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}
