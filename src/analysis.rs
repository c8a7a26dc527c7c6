//! Differ: compares two snapshots and reports what changed.

use crate::snapshot::Snapshot;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// What changed between two snapshots of a watched directory.
///
/// `mod_tt` is the set of test sources that were themselves modified.
/// `mod_pp` maps each modified production source to the tests that depend on
/// it (through imports or a static mapping). The modules actually due to run
/// in a cycle are the union of `mod_tt` and every value in `mod_pp`.
#[derive(Debug, Default, Clone)]
pub struct Analysis {
    pub mod_tt: HashSet<PathBuf>,
    pub mod_pp: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl Analysis {
    pub fn to_run(&self) -> HashSet<PathBuf> {
        let mut run = self.mod_tt.clone();
        for tests in self.mod_pp.values() {
            run.extend(tests.iter().cloned());
        }
        run
    }

    pub fn is_empty(&self) -> bool {
        self.mod_tt.is_empty() && self.mod_pp.values().all(|t| t.is_empty())
    }
}

fn newer(now: &Snapshot, prev: &Snapshot, path: &PathBuf) -> bool {
    match prev.mtimes.get(path) {
        None => true,
        Some(&old) => now.mtimes.get(path).copied().unwrap_or(old) > old,
    }
}

/// Computes what changed between `prev` and `now`. `pool` is used only if the
/// reverse index over `now`'s tests has not yet been built.
pub fn diff(prev: &Snapshot, now: &Snapshot, pool: &rayon::ThreadPool) -> Analysis {
    let mut analysis = Analysis::default();

    for test in &now.tests {
        if newer(now, prev, test) {
            analysis.mod_tt.insert(test.clone());
        }
    }

    for prod in &now.productions {
        if newer(now, prev, prod) {
            let dependents = now.production_to_tests(pool, prod);
            analysis.mod_pp.insert(prod.clone(), dependents);
        }
    }

    analysis
}
