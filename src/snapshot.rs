//! Immutable capture of discovered sources, their mtimes, and a lazily-built
//! production-to-tests reverse index.

use crate::import_extractor::{production_dependencies, Resolver};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::UNIX_EPOCH;

/// User-declared always-on production -> tests edges, registered before the
/// first cycle via the `PRODUCTION_PATH->TEST_PATH` syntax.
pub type StaticMappings = HashMap<PathBuf, Vec<PathBuf>>;

fn mtime_ns(path: &Path) -> i128 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| i128::from(d.as_secs()) * 1_000_000_000 + i128::from(d.subsec_nanos()))
}

pub struct Snapshot {
    pub(crate) tests: HashSet<PathBuf>,
    pub(crate) productions: HashSet<PathBuf>,
    pub(crate) mtimes: HashMap<PathBuf, i128>,
    static_mappings: Arc<StaticMappings>,
    root_package: PathBuf,
    sub_package_dirs: Vec<PathBuf>,
    reverse_index: OnceLock<HashMap<PathBuf, HashSet<PathBuf>>>,
}

impl Snapshot {
    /// Captures `mtime_ns` for every discovered path eagerly. The reverse
    /// index is built lazily on first use of `production_to_tests`.
    pub fn capture(
        tests: HashSet<PathBuf>,
        productions: HashSet<PathBuf>,
        static_mappings: Arc<StaticMappings>,
        root_package: PathBuf,
        sub_package_dirs: Vec<PathBuf>,
    ) -> Self {
        let mut mtimes = HashMap::with_capacity(tests.len() + productions.len());
        for t in &tests {
            mtimes.insert(t.clone(), mtime_ns(t));
        }
        for p in &productions {
            mtimes.insert(p.clone(), mtime_ns(p));
        }
        Self {
            tests,
            productions,
            mtimes,
            static_mappings,
            root_package,
            sub_package_dirs,
            reverse_index: OnceLock::new(),
        }
    }

    pub fn tests(&self) -> &HashSet<PathBuf> {
        &self.tests
    }

    pub fn productions(&self) -> &HashSet<PathBuf> {
        &self.productions
    }

    fn build_index(&self, pool: &rayon::ThreadPool) -> HashMap<PathBuf, HashSet<PathBuf>> {
        let resolver = Resolver {
            root_package: &self.root_package,
            sub_package_dirs: &self.sub_package_dirs,
        };
        let per_test: Vec<(PathBuf, HashSet<PathBuf>)> = pool.install(|| {
            self.tests
                .par_iter()
                .map(|t| (t.clone(), production_dependencies(t, &resolver)))
                .collect()
        });

        let mut index: HashMap<PathBuf, HashSet<PathBuf>> = HashMap::new();
        for (test, deps) in per_test {
            for dep in deps {
                index.entry(dep).or_default().insert(test.clone());
            }
        }
        for (prod, mapped_tests) in self.static_mappings.iter() {
            if self.productions.contains(prod) {
                index.entry(prod.clone()).or_default().extend(mapped_tests.iter().cloned());
            }
        }
        index
    }

    /// Tests that depend on `prod`, either through imports or a static
    /// mapping. Built once per snapshot, on first call, then cached.
    pub fn production_to_tests(&self, pool: &rayon::ThreadPool, prod: &Path) -> HashSet<PathBuf> {
        let index = self.reverse_index.get_or_init(|| self.build_index(pool));
        index.get(prod).cloned().unwrap_or_default()
    }
}
