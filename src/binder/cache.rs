//! @acp:module "Choice Cache"
//! @acp:summary "Per-invocation memo of evaluated choice sets shared by both binders"
//! @acp:domain cli
//! @acp:layer service

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{CliError, Result};
use crate::model::{normalize, validate_choice_set, Choice, ChoiceSource, Param};

type Evaluated = std::result::Result<Arc<[Choice]>, String>;

/// @acp:summary "Evaluated choice sets keyed by command path and parameter name"
///
/// Cloning shares the underlying map. A computed set is evaluated the first
/// time either binder asks for it and reused for the rest of the invocation.
/// A set that fails validation stays failed for the invocation.
#[derive(Debug, Clone, Default)]
pub struct ChoiceCache {
    resolved: Arc<Mutex<HashMap<String, Evaluated>>>,
}

impl ChoiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a parameter of the command at `path`
    pub fn key<S: AsRef<str>>(path: &[S], param: &str) -> String {
        let path: Vec<&str> = path.iter().map(|segment| segment.as_ref()).collect();
        format!("{}::{}", path.join(" "), param)
    }

    /// @acp:summary "Choices of `param` on the command at `path`"
    ///
    /// `Ok(None)` for a free-form parameter. A computed set is evaluated at
    /// most once and checked like a static one: keys unique, set non-empty,
    /// every default present.
    pub fn choices<S: AsRef<str>>(
        &self,
        path: &[S],
        param: &Param,
    ) -> Result<Option<Arc<[Choice]>>> {
        let f = match param.choices_source() {
            None => return Ok(None),
            Some(ChoiceSource::Static(choices)) => return Ok(Some(Arc::clone(choices))),
            Some(ChoiceSource::Computed(f)) => f,
        };

        let key = Self::key(path, param.name());
        let mut resolved = self.resolved.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = match resolved.get(&key) {
            Some(entry) => entry.clone(),
            None => {
                tracing::debug!(param = %key, "evaluating computed choices");
                let choices: Arc<[Choice]> = normalize(f()).into();
                let command: Vec<&str> = path.iter().map(|segment| segment.as_ref()).collect();
                let entry = validate_choice_set(&command.join(" "), param, &choices)
                    .map(|()| choices)
                    .map_err(|err| match err {
                        CliError::Configuration(message) => message,
                        other => other.to_string(),
                    });
                resolved.insert(key, entry.clone());
                entry
            }
        };
        entry.map(Some).map_err(CliError::Configuration)
    }

    /// First computed set that failed validation during this invocation
    pub fn failure(&self) -> Option<CliError> {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find_map(|entry| entry.as_ref().err())
            .map(|message| CliError::Configuration(message.clone()))
    }

    /// Number of computed sets evaluated so far
    pub fn evaluated(&self) -> usize {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted(calls: &Arc<AtomicUsize>, keys: &'static [&'static str]) -> Param {
        let counter = Arc::clone(calls);
        Param::option("remote").computed_choices(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            keys.iter().map(|key| (*key).into()).collect()
        })
    }

    #[test]
    fn test_computed_choices_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let param = counted(&calls, &["a", "b"]);

        let cache = ChoiceCache::new();
        let first = cache.choices(&["git", "push"], &param).unwrap().unwrap();
        let second = cache.clone().choices(&["git", "push"], &param).unwrap().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.evaluated(), 1);
    }

    #[test]
    fn test_fresh_cache_evaluates_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let param = counted(&calls, &["a"]);

        ChoiceCache::new().choices(&["demo"], &param).unwrap();
        ChoiceCache::new().choices(&["demo"], &param).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_static_and_free_form_bypass_cache() {
        let cache = ChoiceCache::new();
        let fixed = Param::option("x").choices(["a"]);
        assert_eq!(cache.choices(&["demo"], &fixed).unwrap().unwrap()[0].key, "a");
        assert!(cache.choices(&["demo"], &Param::option("y")).unwrap().is_none());
        assert_eq!(cache.evaluated(), 0);
    }

    #[test]
    fn test_computed_default_must_be_a_choice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let param = counted(&calls, &["small", "large"]).default("huge");

        let cache = ChoiceCache::new();
        let err = cache.choices(&["pick"], &param).unwrap_err();
        assert!(matches!(err, CliError::Configuration(ref message) if message.contains("huge")));

        // the failure is remembered, not re-evaluated
        assert!(cache.choices(&["pick"], &param).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(cache.failure(), Some(CliError::Configuration(_))));
    }

    #[test]
    fn test_computed_duplicates_and_empty_sets_are_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ChoiceCache::new();
        assert!(cache.choices(&["a"], &counted(&calls, &["x", "x"])).is_err());
        assert!(cache.choices(&["b"], &counted(&calls, &[])).is_err());
        assert!(cache.choices(&["c"], &counted(&calls, &["x"])).is_ok());
    }

    #[test]
    fn test_key_joins_path() {
        assert_eq!(ChoiceCache::key(&["git", "push"], "tags"), "git push::tags");
    }
}
