//! Static dependency analysis: extracts the set of production sources a test
//! source transitively pulls in through its top-level imports, following one
//! level of re-export when an import target is itself an aggregator module.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tree_sitter::Node;

/// A single top-level import statement, reduced to the fields the resolver
/// needs. Aliases are ignored throughout: only the dotted module path (for
/// `import`) or the imported name (for `from ... import ...`) is used to
/// resolve files and to match re-exports, mirroring how the watcher's own
/// author treats aliasing as cosmetic.
#[derive(Debug, Clone)]
enum TopLevelImport {
    Import(Vec<String>),
    ImportFrom {
        module: Option<String>,
        names: Vec<FromName>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FromName {
    Named(String),
    Wildcard,
}

/// Context needed to resolve dotted module strings against the watched tree.
pub struct Resolver<'a> {
    pub root_package: &'a Path,
    pub sub_package_dirs: &'a [PathBuf],
}

/// Parses only the top-level statements of `path`; returns `None` if the
/// file cannot be read or fails to parse cleanly.
fn top_level_imports(path: &Path) -> Option<Vec<TopLevelImport>> {
    let mut parser = crate::parsing::create_parser().ok()?;
    let parsed = crate::parsing::parse_file(&mut parser, path).ok()?;
    let root = parsed.tree.root_node();
    if root.has_error() {
        return None;
    }

    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "import_statement" => out.push(TopLevelImport::Import(import_statement_paths(child, &parsed.source))),
            "import_from_statement" => out.push(import_from_statement(child, &parsed.source)),
            _ => {}
        }
    }
    Some(out)
}

fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Every dotted path bound by a (possibly comma-separated, possibly aliased)
/// `import` statement. Aliases are ignored: the raw dotted path is what the
/// resolver matches against, same as the original watcher.
fn import_statement_paths(node: Node, source: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => paths.push(node_text(child, source).to_string()),
            "aliased_import" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    paths.push(node_text(name_node, source).to_string());
                }
            }
            _ => {}
        }
    }
    paths
}

fn from_statement_names(node: Node, source: &str) -> Vec<FromName> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => names.push(FromName::Named(node_text(child, source).to_string())),
            "aliased_import" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    names.push(FromName::Named(node_text(name_node, source).to_string()));
                }
            }
            "wildcard_import" => names.push(FromName::Wildcard),
            _ => {}
        }
    }
    names
}

/// The dotted module string of a `from MODULE import ...` statement; `None`
/// for a bare `from . import name` with no module name at all (mirrors
/// `ast.ImportFrom.module is None`). A relative `from .foo import name`
/// yields `"foo"`; the leading dots are stripped and resolution then falls
/// back to the importer's own directory, which is where `.foo` actually
/// lives.
fn from_statement_module(node: Node, source: &str) -> Option<String> {
    let module_node = node.child_by_field_name("module_name")?;
    match module_node.kind() {
        "relative_import" => {
            let mut cursor = module_node.walk();
            module_node
                .children(&mut cursor)
                .find(|c| c.kind() == "dotted_name")
                .map(|n| node_text(n, source).to_string())
        }
        _ => Some(node_text(module_node, source).to_string()),
    }
}

fn import_from_statement(node: Node, source: &str) -> TopLevelImport {
    TopLevelImport::ImportFrom {
        module: from_statement_module(node, source),
        names: from_statement_names(node, source),
    }
}

/// Resolves a dotted module string to a `.py` file: first relative to the
/// parent of the root package, then relative to the importer's directory.
fn resolve_module(module_string: &str, importer: &Path, root_package: &Path) -> Option<PathBuf> {
    let rel = PathBuf::from(module_string.replace('.', std::path::MAIN_SEPARATOR_STR)).with_extension("py");
    if let Some(parent) = root_package.parent() {
        let candidate = parent.join(&rel);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    let importer_dir = importer.parent().unwrap_or(importer);
    let candidate = importer_dir.join(&rel);
    if candidate.exists() {
        return Some(candidate);
    }
    None
}

/// True iff `module_string` names the root package itself, or a package
/// that is part of the watched tree's sub-packages.
fn is_package_import(module_string: &str, resolver: &Resolver) -> bool {
    let tail = module_string.rsplit('.').next().unwrap_or(module_string);
    if Some(tail) == resolver.root_package.file_name().and_then(|n| n.to_str()) {
        return true;
    }
    let Some(parent) = resolver.root_package.parent() else {
        return false;
    };
    let abs = parent.join(module_string.replace('.', std::path::MAIN_SEPARATOR_STR));
    resolver.sub_package_dirs.iter().any(|d| *d == abs)
}

/// Follows a single level of re-export: searches `aggregator`'s own
/// top-level imports for a binding of `imp`, recursing once more when that
/// binding itself names another file. Returns `(target, true)` when found,
/// `(None, false)` when the search terminates without a match.
fn resolve_from_import(aggregator: &Path, imp: &str, resolver: &Resolver) -> (Option<PathBuf>, bool) {
    let Some(imports) = top_level_imports(aggregator) else {
        return (None, false);
    };
    for stmt in imports {
        match stmt {
            TopLevelImport::ImportFrom { module: Some(module), names } => {
                if let Some(dep) = resolve_module(&module, aggregator, resolver.root_package) {
                    for name in &names {
                        match name {
                            FromName::Named(n) if n == imp => {
                                return resolve_from_import(&dep, imp, resolver);
                            }
                            FromName::Wildcard => {
                                let tail = module.rsplit('.').next().unwrap_or(&module);
                                if tail == imp {
                                    return (Some(dep), true);
                                }
                            }
                            _ => {}
                        }
                    }
                } else if is_package_import(&module, resolver) {
                    for name in &names {
                        if let FromName::Named(n) = name {
                            if n == imp {
                                return match resolve_module(&format!("{module}.{n}"), aggregator, resolver.root_package) {
                                    Some(p) => (Some(p), true),
                                    None => (None, false),
                                };
                            }
                        }
                    }
                }
            }
            TopLevelImport::Import(paths) => {
                for p in &paths {
                    if p == imp {
                        if let Some(dep) = resolve_module(p, aggregator, resolver.root_package) {
                            return (Some(dep), true);
                        }
                    }
                }
            }
            TopLevelImport::ImportFrom { module: None, .. } => {}
        }
    }
    (None, false)
}

/// The set of production-source paths `test_path` depends on through its
/// top-level imports. Deterministic and pure: safe to call from any thread.
/// Returns an empty set if the file cannot be parsed cleanly — the
/// Dispatcher will surface the real error when the module is actually run.
pub fn production_dependencies(test_path: &Path, resolver: &Resolver) -> HashSet<PathBuf> {
    let mut deps = HashSet::new();
    let Some(imports) = top_level_imports(test_path) else {
        return deps;
    };

    for stmt in imports {
        match stmt {
            TopLevelImport::ImportFrom { module: Some(module), names } => {
                if let Some(aggregator) = resolve_module(&module, test_path, resolver.root_package) {
                    let mut any_unresolved = false;
                    for name in &names {
                        match name {
                            FromName::Named(n) => {
                                let (resolved, found) = resolve_from_import(&aggregator, n, resolver);
                                if found {
                                    if let Some(r) = resolved {
                                        deps.insert(r);
                                    }
                                } else {
                                    any_unresolved = true;
                                }
                            }
                            FromName::Wildcard => any_unresolved = true,
                        }
                    }
                    if any_unresolved {
                        deps.insert(aggregator);
                    }
                } else if is_package_import(&module, resolver) {
                    for name in &names {
                        if let FromName::Named(n) = name {
                            if let Some(p) = resolve_module(&format!("{module}.{n}"), test_path, resolver.root_package) {
                                deps.insert(p);
                            }
                        }
                    }
                }
            }
            TopLevelImport::Import(paths) => {
                for p in &paths {
                    if let Some(dep) = resolve_module(&p, test_path, resolver.root_package) {
                        deps.insert(dep);
                    }
                }
            }
            TopLevelImport::ImportFrom { module: None, .. } => {}
        }
    }
    deps
}
