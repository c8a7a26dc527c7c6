//! Tree Walker: enumerates sub-packages, test sources and production sources
//! beneath a watched directory, and resolves its root package.

use crate::path_classifier::{is_package, is_production_source, is_test_source};
use std::path::{Path, PathBuf};

/// A package directory discovered beneath (or at) the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub dir: PathBuf,
}

/// Enumerates the watched directory plus every descendant directory that is
/// itself a package and whose basename is not ignored. Descent halts at a
/// non-package directory: a directory without `__init__.py` is never
/// traversed further.
pub fn sub_packages(root: &Path, ignore_packages: &[String]) -> Vec<PackageRef> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = dir.read_dir() else {
            out.push(PackageRef { dir });
            continue;
        };
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if ignore_packages.iter().any(|p| p == name) || !is_package(&path) {
                continue;
            }
            stack.push(path);
        }
        out.push(PackageRef { dir });
    }
    out
}

/// Every test-source file under every sub-package.
pub fn test_sources(
    root: &Path,
    ignore_packages: &[String],
    ignore_modules: &[String],
) -> Vec<PathBuf> {
    sub_packages(root, ignore_packages)
        .into_iter()
        .flat_map(|pkg| {
            pkg.dir
                .read_dir()
                .into_iter()
                .flatten()
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| is_test_source(p, ignore_modules))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Every production-source file under every sub-package, plus (when the root
/// package differs from the watched directory) production files directly
/// under the root package.
pub fn production_sources(
    root: &Path,
    ignore_packages: &[String],
    ignore_modules: &[String],
) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = sub_packages(root, ignore_packages)
        .into_iter()
        .flat_map(|pkg| {
            pkg.dir
                .read_dir()
                .into_iter()
                .flatten()
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| is_production_source(p, ignore_modules))
                .collect::<Vec<_>>()
        })
        .collect();

    let root_package = resolve_root_package(root);
    if root_package != root {
        if let Ok(entries) = root_package.read_dir() {
            out.extend(
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| is_production_source(p, ignore_modules)),
            );
        }
    }
    out
}

/// Climbs ancestors of `dir` while the parent is still a package; returns
/// the outermost such ancestor.
pub fn resolve_root_package(dir: &Path) -> PathBuf {
    let mut current = dir
        .canonicalize()
        .unwrap_or_else(|_| dir.to_path_buf());
    while let Some(parent) = current.parent() {
        if is_package(parent) {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }
    current
}
