//! Command-line configuration: clap-derived flags layered over an optional
//! `.tdwconfig` TOML file, both layered over the built-in defaults.

use crate::defaults;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "tdw", version, about = "Watches a Python package and reruns the tests affected by each change")]
pub struct Cli {
    /// Watched directory; must be a Python package (contains __init__.py).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Sub-package directory name to never descend into. Repeatable.
    #[arg(long = "ignore-package")]
    pub ignore_package: Vec<String>,

    /// Module basename to never treat as a test or production source. Repeatable.
    #[arg(long = "ignore-module")]
    pub ignore_module: Vec<String>,

    /// Seconds between idle-waiting polls of the watched tree.
    #[arg(long)]
    pub frequency: Option<f64>,

    /// Seconds a single test module may run before being killed.
    #[arg(long = "run-timeout")]
    pub run_timeout: Option<f64>,

    /// Static `PRODUCTION_PATH->TEST_PATH` dependency mapping. Repeatable.
    #[arg(long = "map")]
    pub map: Vec<String>,

    /// Enable debug mode: run every discovered test once, then exit.
    #[arg(long)]
    pub dbg: bool,

    /// Interpreter used to launch test modules.
    #[arg(long = "python-launcher")]
    pub python_launcher: Option<String>,
}

/// Fully resolved configuration: CLI flags, layered over `.tdwconfig`,
/// layered over built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub ignore_packages: Vec<String>,
    pub ignore_modules: Vec<String>,
    pub frequency: Duration,
    pub run_timeout: Duration,
    pub map: Vec<String>,
    pub dbg: bool,
    pub python_launcher: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            ignore_packages: defaults::IGNORE_PACKAGES.iter().map(|s| (*s).to_string()).collect(),
            ignore_modules: defaults::IGNORE_MODULES.iter().map(|s| (*s).to_string()).collect(),
            frequency: Duration::from_secs_f64(defaults::FREQUENCY_SECS),
            run_timeout: Duration::from_secs_f64(defaults::RUN_TIMEOUT_SECS),
            map: Vec::new(),
            dbg: false,
            python_launcher: defaults::PYTHON_LAUNCHER.to_string(),
        }
    }
}

fn get_f64(table: &toml::Table, key: &str) -> Option<f64> {
    table.get(key).and_then(toml::Value::as_float)
}

fn get_string_array(table: &toml::Table, key: &str) -> Vec<String> {
    table
        .get(key)
        .and_then(toml::Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

impl Config {
    fn merge_from_toml(&mut self, content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else { return };
        if let Some(freq) = get_f64(&table, "frequency") {
            self.frequency = Duration::from_secs_f64(freq);
        }
        if let Some(timeout) = get_f64(&table, "run_timeout") {
            self.run_timeout = Duration::from_secs_f64(timeout);
        }
        if let Some(launcher) = table.get("python_launcher").and_then(toml::Value::as_str) {
            self.python_launcher = launcher.to_string();
        }
        let ignore_packages = get_string_array(&table, "ignore_package");
        if !ignore_packages.is_empty() {
            self.ignore_packages.extend(ignore_packages);
        }
        let ignore_modules = get_string_array(&table, "ignore_module");
        if !ignore_modules.is_empty() {
            self.ignore_modules.extend(ignore_modules);
        }
        self.map.extend(get_string_array(&table, "map"));
    }

    fn load_file(path: &Path) -> Self {
        let mut config = Self::default();
        if let Ok(content) = std::fs::read_to_string(path) {
            config.merge_from_toml(&content);
        }
        config
    }

    /// Loads `.tdwconfig` from `dir` if present, then applies `cli` on top.
    pub fn resolve(cli: Cli, dir: &Path) -> Self {
        let mut config = Self::load_file(&dir.join(".tdwconfig"));

        config.path = cli.path;
        config.ignore_packages.extend(cli.ignore_package);
        config.ignore_modules.extend(cli.ignore_module);
        if let Some(freq) = cli.frequency {
            config.frequency = Duration::from_secs_f64(freq);
        }
        if let Some(timeout) = cli.run_timeout {
            config.run_timeout = Duration::from_secs_f64(timeout);
        }
        config.map.extend(cli.map);
        config.dbg = cli.dbg;
        if let Some(launcher) = cli.python_launcher {
            config.python_launcher = launcher;
        }
        config
    }
}
