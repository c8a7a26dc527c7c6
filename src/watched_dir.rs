//! Control Surface glue: owns a watched directory's configuration, its
//! previous snapshot, and the static dependency mappings registered against
//! it, and produces the Analysis for each cycle.

use crate::analysis::{self, Analysis};
use crate::dispatcher::{self, DispatchOutcome};
use crate::error::DirNoPackage;
use crate::path_classifier::is_package;
use crate::snapshot::{Snapshot, StaticMappings};
use crate::walker;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct WatchedDir {
    dir: PathBuf,
    root_package: PathBuf,
    ignore_packages: Vec<String>,
    ignore_modules: Vec<String>,
    run_timeout: Duration,
    python_launcher: String,
    static_mappings: StaticMappings,
    previous: Snapshot,
}

/// Resolves `spec` against `base` when it names an existing file there,
/// falling back to treating it as already relative-to-cwd/absolute.
fn resolve_mapping_side(spec: &str, base: &Path) -> PathBuf {
    let candidate = base.join(spec);
    if candidate.exists() {
        candidate
    } else {
        PathBuf::from(spec)
    }
}

impl WatchedDir {
    pub fn new(
        dir: PathBuf,
        ignore_packages: Vec<String>,
        ignore_modules: Vec<String>,
        run_timeout: Duration,
        python_launcher: String,
    ) -> Result<Self, DirNoPackage> {
        if !is_package(&dir) {
            return Err(DirNoPackage { dir });
        }
        let root_package = walker::resolve_root_package(&dir);
        let static_mappings = StaticMappings::new();
        let sub_package_dirs = Self::sub_package_dirs(&dir, &ignore_packages);
        let previous =
            Snapshot::capture(HashSet::new(), HashSet::new(), Arc::new(static_mappings.clone()), root_package.clone(), sub_package_dirs);
        Ok(Self {
            dir,
            root_package,
            ignore_packages,
            ignore_modules,
            run_timeout,
            python_launcher,
            static_mappings,
            previous,
        })
    }

    /// Parses and registers a `PRODUCTION_PATH->TEST_PATH` static mapping,
    /// resolving each side against the root package when it exists there.
    pub fn register_mapping(&mut self, spec: &str) {
        let Some((prod, test)) = spec.split_once("->") else {
            eprintln!("tdw: ignoring malformed mapping '{spec}' (expected PRODUCTION_PATH->TEST_PATH)");
            return;
        };
        let prod_path = resolve_mapping_side(prod.trim(), &self.root_package);
        let test_path = resolve_mapping_side(test.trim(), &self.root_package);
        self.static_mappings.entry(prod_path).or_default().push(test_path);
    }

    fn sub_package_dirs(dir: &Path, ignore_packages: &[String]) -> Vec<PathBuf> {
        walker::sub_packages(dir, ignore_packages).into_iter().map(|p| p.dir).collect()
    }

    fn capture(
        dir: &Path,
        root_package: &Path,
        ignore_packages: &[String],
        ignore_modules: &[String],
        static_mappings: &StaticMappings,
    ) -> Snapshot {
        let tests: HashSet<PathBuf> = walker::test_sources(dir, ignore_packages, ignore_modules).into_iter().collect();
        let productions: HashSet<PathBuf> =
            walker::production_sources(dir, ignore_packages, ignore_modules).into_iter().collect();
        let sub_package_dirs = Self::sub_package_dirs(dir, ignore_packages);
        Snapshot::capture(tests, productions, Arc::new(static_mappings.clone()), root_package.to_path_buf(), sub_package_dirs)
    }

    /// Captures a fresh snapshot, diffs it against the previous one, and
    /// swaps it in as the new previous snapshot.
    pub fn test_modules_to_run(&mut self, pool: &rayon::ThreadPool) -> Analysis {
        let now = Self::capture(&self.dir, &self.root_package, &self.ignore_packages, &self.ignore_modules, &self.static_mappings);
        let result = analysis::diff(&self.previous, &now, pool);
        self.previous = now;
        result
    }

    /// All currently discoverable test sources, bypassing the differ
    /// entirely. Used for a forced full rerun.
    pub fn all_test_sources(&self) -> Vec<PathBuf> {
        walker::test_sources(&self.dir, &self.ignore_packages, &self.ignore_modules)
    }

    pub fn run(&self, paths: &[PathBuf], pool: &rayon::ThreadPool) -> DispatchOutcome {
        dispatcher::run_many(paths, &self.python_launcher, self.run_timeout, &self.root_package, pool)
    }

    pub fn ignore_modules(&self) -> &[String] {
        &self.ignore_modules
    }
}
