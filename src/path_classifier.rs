//! Classifies filesystem entries as packages, test sources, or production sources.

use std::path::Path;

/// True iff `dir` is a directory containing a file literally named `__init__.py`.
pub fn is_package(dir: &Path) -> bool {
    let Ok(entries) = dir.read_dir() else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        entry.file_name() == "__init__.py" && entry.path().is_file()
    })
}

/// True iff `path` is a file whose basename marks it as a test source and the
/// basename is not ignored.
pub fn is_test_source(path: &Path, ignore_modules: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !path.is_file() {
        return false;
    }
    (name.starts_with("test_") || name.ends_with("_test.py")) && !ignore_modules.iter().any(|m| m == name)
}

/// True iff `path` is a `.py` file that is neither ignored nor a test source.
pub fn is_production_source(path: &Path, ignore_modules: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file()
        && name.ends_with(".py")
        && !ignore_modules.iter().any(|m| m == name)
        && !is_test_source(path, ignore_modules)
}
