//! Property tests for dependency-triggered invalidation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use proptest::prelude::*;

use lathe::domain::entities::{CacheEntry, DependencyCache};
use lathe::domain::services::propagate_to_fixpoint;

fn key(i: usize) -> String {
    format!("/src/f{}.html", i)
}

/// Random dependency graph over `n` files: edges point from a file to the
/// files it depends on
fn graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..12).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n), 0..(n * 2));
        (Just(n), edges)
    })
}

fn cache_for(n: usize, edges: &[(usize, usize)]) -> DependencyCache {
    let mut cache = DependencyCache::new();
    for i in 0..n {
        let deps: Vec<PathBuf> = edges
            .iter()
            .filter(|(from, to)| *from == i && from != to)
            .map(|(_, to)| PathBuf::from(key(*to)))
            .collect();
        cache.set(
            key(i),
            CacheEntry::compiled(Some(0), PathBuf::from(format!("/out/f{}.html", i)), deps),
        );
    }
    cache
}

/// Everything that reaches `start` through dependency edges
fn reachable(n: usize, edges: &[(usize, usize)], start: usize) -> BTreeSet<String> {
    let mut seen = BTreeSet::from([start]);
    loop {
        let before = seen.len();
        for &(from, to) in edges {
            if from != to && seen.contains(&to) {
                seen.insert(from);
            }
        }
        if seen.len() == before {
            return seen.into_iter().filter(|i| *i < n).map(key).collect();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Propagation to a fixpoint marks exactly the transitive
    /// dependents of the changed file, and terminates on cycles.
    #[test]
    fn property_fixpoint_is_transitive_closure((n, edges) in graph(), start in 0usize..12) {
        prop_assume!(start < n);
        let mut cache = cache_for(n, &edges);
        let mut dirty = BTreeSet::from([key(start)]);

        let hops = propagate_to_fixpoint(&mut cache, &mut dirty);

        prop_assert_eq!(&dirty, &reachable(n, &edges, start));
        prop_assert!(hops < n);
    }
}
