//! Dirty-checking rules for the dependency cache
//!
//! Applied when the cache is rehydrated at startup and at every watch batch.
//!
//! 1. no entry: dirty
//! 2. single destination: dirty if it is missing or older than the source
//! 3. destination list (namespace group): dirty if any destination is missing,
//!    and every member of the group goes down with it
//! 4. modified timestamp only: dirty if the source is newer than the record
//!
//! Dependency-triggered invalidation is a single hop per call to
//! [`propagate`]; [`propagate_to_fixpoint`] repeats it until nothing new
//! becomes dirty.

use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::entities::{to_millis, CacheEntry, DependencyCache, Destination};
use crate::domain::ports::FileSystem;

/// Whether `source` must be rebuilt given its cache entry
pub fn is_dirty(fs: &dyn FileSystem, source: &Path, entry: Option<&CacheEntry>) -> bool {
    let Some(entry) = entry else {
        return true;
    };

    match entry.destination() {
        Some(Destination::One(dest)) => {
            match (fs.modified(source), fs.modified(dest)) {
                (Some(src), Some(out)) => to_millis(src) > to_millis(out),
                _ => true,
            }
        }
        Some(Destination::Many(dests)) => dests.iter().any(|d| !fs.exists(d)),
        None => match (entry.modified(), fs.modified(source)) {
            (Some(recorded), Some(src)) => to_millis(src) > recorded,
            _ => true,
        },
    }
}

/// Apply the direct rules to every entry, then cascade group failures.
pub fn check(fs: &dyn FileSystem, cache: &DependencyCache) -> BTreeSet<String> {
    let mut dirty: BTreeSet<String> = cache
        .entries()
        .filter(|(key, entry)| is_dirty(fs, Path::new(key), Some(entry)))
        .map(|(key, _)| key.to_string())
        .collect();
    cascade_groups(cache, &mut dirty);
    dirty
}

/// Mark every member of a dirty group entry dirty as well
pub fn cascade_groups(cache: &DependencyCache, dirty: &mut BTreeSet<String>) {
    let groups: Vec<String> = dirty
        .iter()
        .filter(|key| cache.get(key).is_some_and(|e| e.is_group()))
        .cloned()
        .collect();

    for group in groups {
        let members: Vec<String> = cache.members_of(&group).map(String::from).collect();
        dirty.extend(members);
    }
}

/// One hop of dependency-triggered invalidation.
///
/// Every entry whose dependency list names a dirty path becomes dirty, and the
/// dirty dependency's own (non-group) entry is cleared so it is re-resolved.
/// Returns the keys newly marked.
pub fn propagate(cache: &mut DependencyCache, dirty: &mut BTreeSet<String>) -> Vec<String> {
    let mut added = Vec::new();
    let mut cleared = Vec::new();

    for changed in dirty.iter() {
        let dependents: Vec<String> = cache
            .dependents_of(Path::new(changed))
            .filter(|key| key != changed && !dirty.contains(*key))
            .map(String::from)
            .collect();
        if dependents.is_empty() {
            continue;
        }
        if cache.get(changed).is_some_and(|e| !e.is_group()) {
            cleared.push(changed.clone());
        }
        for key in dependents {
            if !added.contains(&key) {
                added.push(key);
            }
        }
    }

    for key in &cleared {
        cache.remove(key);
    }
    dirty.extend(added.iter().cloned());
    added
}

/// Repeat [`propagate`] until no additional entry becomes dirty.
/// Returns the number of hops that added something.
pub fn propagate_to_fixpoint(cache: &mut DependencyCache, dirty: &mut BTreeSet<String>) -> usize {
    let mut hops = 0;
    loop {
        let added = propagate(cache, dirty);
        if added.is_empty() {
            return hops;
        }
        hops += 1;
        cascade_groups(cache, dirty);
    }
}
