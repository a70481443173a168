//! Environment overrides handed to spawned tools.
//!
//! The parent process environment is never written. Instead each run keeps a
//! [`ChildEnv`] overlay that is applied to every child at spawn time, and
//! stage-level changes are scoped over it with [`EnvScope`].

use std::collections::BTreeMap;
use tokio::process::Command;

/// AFNI's output conflict setting.
pub const AFNI_DECONFLICT: &str = "AFNI_DECONFLICT";

/// OpenMP worker thread count read by AFNI, FSL, and FreeSurfer.
pub const OMP_NUM_THREADS: &str = "OMP_NUM_THREADS";

/// An overlay of environment entries for child processes.
///
/// A key is either set to a value, explicitly removed, or absent from the
/// overlay (the child inherits whatever the parent has).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildEnv {
    vars: BTreeMap<String, Option<String>>,
}

/// The overlay entry for one key before a scoped change.
type Prior = Option<Option<String>>;

impl ChildEnv {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` for children.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), Some(value.into()));
    }

    /// Removes `key` from children's environment.
    pub fn unset(&mut self, key: impl Into<String>) {
        self.vars.insert(key.into(), None);
    }

    /// Returns the overlay entry for `key`: `None` if the overlay does not
    /// mention it, `Some(None)` if it is removed, `Some(Some(v))` if set.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<Option<&str>> {
        self.vars.get(key).map(Option::as_deref)
    }

    /// Returns the value set for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entry(key).flatten()
    }

    /// Returns true if the overlay has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates over the overlay entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Applies the overlay to a command about to be spawned.
    pub fn apply(&self, command: &mut Command) {
        for (key, value) in &self.vars {
            match value {
                Some(value) => command.env(key, value),
                None => command.env_remove(key),
            };
        }
    }

    /// Sets each of `overrides`, remembering what they replaced.
    ///
    /// Restoring the returned scope puts every touched key back exactly as it
    /// was, including removing keys that were not in the overlay before.
    pub fn scoped<'a, I>(&mut self, overrides: I) -> EnvScope
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut saved: Vec<(String, Prior)> = Vec::new();
        for (key, value) in overrides {
            let prior = self.vars.insert(key.clone(), Some(value.clone()));
            // Depth one per key: the first save wins if a key repeats.
            if !saved.iter().any(|(k, _)| k == key) {
                saved.push((key.clone(), prior));
            }
        }
        EnvScope { saved }
    }
}

/// Saved overlay entries to put back after a scoped change.
#[derive(Debug, Default)]
#[must_use = "a scope must be restored to undo its overrides"]
pub struct EnvScope {
    saved: Vec<(String, Prior)>,
}

impl EnvScope {
    /// Returns the keys this scope overrode.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.saved.iter().map(|(k, _)| k.as_str())
    }

    /// Puts the overridden entries back.
    pub fn restore(self, env: &mut ChildEnv) {
        for (key, prior) in self.saved {
            match prior {
                Some(value) => {
                    env.vars.insert(key, value);
                }
                None => {
                    env.vars.remove(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn overrides(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_restore_when_absent_leaves_absent() {
        let mut env = ChildEnv::new();
        let scope = env.scoped(&overrides(&[(OMP_NUM_THREADS, "4")]));
        assert_eq!(env.get(OMP_NUM_THREADS), Some("4"));

        scope.restore(&mut env);
        assert_eq!(env.entry(OMP_NUM_THREADS), None);
        assert!(env.is_empty());
    }

    #[test]
    fn test_restore_keeps_prior_value() {
        let mut env = ChildEnv::new();
        env.set(AFNI_DECONFLICT, "NO");

        let scope = env.scoped(&overrides(&[(AFNI_DECONFLICT, "OVERWRITE")]));
        assert_eq!(env.get(AFNI_DECONFLICT), Some("OVERWRITE"));

        scope.restore(&mut env);
        assert_eq!(env.get(AFNI_DECONFLICT), Some("NO"));
    }

    #[test]
    fn test_restore_keeps_explicit_removal() {
        let mut env = ChildEnv::new();
        env.unset(OMP_NUM_THREADS);

        let scope = env.scoped(&overrides(&[(OMP_NUM_THREADS, "2")]));
        scope.restore(&mut env);

        assert_eq!(env.entry(OMP_NUM_THREADS), Some(None));
    }

    #[test]
    fn test_apply_sets_and_removes() {
        let mut env = ChildEnv::new();
        env.set(OMP_NUM_THREADS, "8");
        env.unset("FSLOUTPUTTYPE");

        let mut command = Command::new("true");
        env.apply(&mut command);

        let envs: Vec<(String, Option<String>)> = command
            .as_std()
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.map(|v| v.to_string_lossy().into_owned()),
                )
            })
            .collect();
        assert!(envs.contains(&("OMP_NUM_THREADS".to_string(), Some("8".to_string()))));
        assert!(envs.contains(&("FSLOUTPUTTYPE".to_string(), None)));
    }
}
