//! Default configuration values

/// Default cycle sleep period, in seconds.
pub const FREQUENCY_SECS: f64 = 0.5;

/// Default per-subprocess timeout, in seconds.
pub const RUN_TIMEOUT_SECS: f64 = 20.0;

/// Default interpreter used to launch test modules.
pub const PYTHON_LAUNCHER: &str = "python3";

/// Package basenames that are never descended into.
pub const IGNORE_PACKAGES: &[&str] = &["__pycache__"];

/// Module basenames that are never classified as test or production sources.
pub const IGNORE_MODULES: &[&str] = &["__init__.py"];

/// Flag passed to a test module subprocess so it emits structured JSON.
pub const REPORT_ARG: &str = "--report=json";

/// Poll interval used while waiting on a subprocess with a timeout.
pub const TIMEOUT_POLL_MILLIS: u64 = 20;
