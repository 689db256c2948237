//! External identifier → local row id mapping.

use std::collections::{HashMap, HashSet};

/// Resolves the URLs one remote record uses to point at another kind.
///
/// Built from the records of the referenced kind right after they were upserted,
/// so every record carrying a URL has an entry.
#[derive(Debug, Default, Clone)]
pub struct ReferenceMap {
    ids: HashMap<String, i64>,
}

/// Outcome of resolving one record's reference list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Local ids in first-seen order, without duplicates.
    pub ids: Vec<i64>,
    /// References with no entry in the map.
    pub misses: usize,
}

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(external url, local id)` pairs.
    /// Pairs without a URL cannot be referenced and are skipped.
    pub fn from_upserted<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, i64)>,
    {
        let mut map = Self::new();
        for (url, id) in pairs {
            if let Some(url) = url {
                map.insert(url, id);
            }
        }
        map
    }

    pub fn insert(&mut self, url: &str, id: i64) {
        self.ids.insert(url.to_string(), id);
    }

    pub fn get(&self, url: &str) -> Option<i64> {
        self.ids.get(url).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolves every reference it can. Unknown references are skipped, not errors:
    /// the remote is allowed to point at records it does not serve.
    pub fn resolve<S: AsRef<str>>(&self, refs: &[S]) -> Resolved {
        let mut seen = HashSet::new();
        let mut resolved = Resolved::default();

        for r in refs {
            match self.get(r.as_ref()) {
                Some(id) => {
                    if seen.insert(id) {
                        resolved.ids.push(id);
                    }
                }
                None => {
                    tracing::debug!(reference = r.as_ref(), "Skipping dangling reference");
                    resolved.misses += 1;
                }
            }
        }

        resolved
    }
}
