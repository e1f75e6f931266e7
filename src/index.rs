//! Name index over the filters visible in one [`crate::version::Version`].
//!
//! The associative container itself (in production, typically a radix or
//! ART-style structure) is an external collaborator; only its required
//! operations matter here, so this is a plain `BTreeMap`, which gives
//! deterministic sorted iteration as a side benefit for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::wrapper::FilterWrapper;

/// Snapshot of name -> filter bindings for one version. Cheap to clone: the
/// map's values are `Arc`s, so cloning a `NameIndex` shares every
/// [`FilterWrapper`] rather than duplicating it.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    entries: BTreeMap<Vec<u8>, Arc<FilterWrapper>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &[u8]) -> Option<Arc<FilterWrapper>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &[u8]) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns a copy of this index with `name` bound to `wrapper`. The
    /// caller installs the result as the index of a new [`crate::version::Version`]
    /// rather than mutating this one in place, since older versions must
    /// keep seeing the old binding.
    pub fn with_inserted(&self, name: Vec<u8>, wrapper: Arc<FilterWrapper>) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(name, wrapper);
        Self { entries }
    }

    /// Returns a copy of this index with `name` removed.
    pub fn with_removed(&self, name: &[u8]) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(name);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &Arc<FilterWrapper>)> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v))
    }

    /// Iterates only entries whose key starts with `prefix`, in sorted order.
    /// Uses `BTreeMap::range` with a computed exclusive upper bound rather
    /// than a linear scan plus `starts_with` filter.
    pub fn iter_prefix<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a [u8], &'a Arc<FilterWrapper>)> {
        use std::ops::Bound;
        let upper = prefix_upper_bound(prefix);
        let range = match &upper {
            Some(upper) => (
                Bound::Included(prefix.to_vec()),
                Bound::Excluded(upper.clone()),
            ),
            None => (Bound::Included(prefix.to_vec()), Bound::Unbounded),
        };
        self.entries.range(range).map(|(k, v)| (k.as_slice(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Smallest key that is strictly greater than every key starting with
/// `prefix`, obtained by incrementing the last non-`0xff` byte and
/// truncating anything after it. `None` if `prefix` is empty or is all
/// `0xff` bytes, meaning no finite upper bound excludes exactly the
/// non-matching keys — callers fall back to an unbounded range end.
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(&last) = upper.last() {
        if last == 0xff {
            upper.pop();
        } else {
            *upper.last_mut().unwrap() += 1;
            return Some(upper);
        }
    }
    None
}
