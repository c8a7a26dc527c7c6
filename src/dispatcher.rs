//! Runs test modules as subprocesses, enforces a per-run timeout, and splits
//! a module's concatenated JSON records back into individual pieces.

use crate::defaults::{REPORT_ARG, TIMEOUT_POLL_MILLIS};
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of running one test module: either JSON records, or an error
/// message keyed by the module's path relative to the watched root.
struct RunOutcome {
    records: Vec<String>,
    error: Option<(String, String)>,
}

impl RunOutcome {
    fn records(records: Vec<String>) -> Self {
        Self { records, error: None }
    }

    fn empty() -> Self {
        Self { records: Vec::new(), error: None }
    }

    fn error(key: String, message: String) -> Self {
        Self { records: Vec::new(), error: Some((key, message)) }
    }
}

/// Aggregate result of running a batch of test modules in parallel.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub records: Vec<String>,
    pub errors: HashMap<String, String>,
}

fn relative_key(path: &Path, root_package: &Path) -> String {
    path.strip_prefix(root_package.parent().unwrap_or(root_package))
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Splits a test module's raw stdout into the individual concatenated JSON
/// objects it printed, one per line-group, joined without a separator on the
/// wire. Each record after the first had its leading `{` swallowed by the
/// split and is re-prepended here.
fn split_json_records(stdout: &str) -> Vec<String> {
    let mut parts = stdout.split("\n{");
    let mut out = Vec::new();
    if let Some(first) = parts.next() {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    for rest in parts {
        out.push(format!("{{{}", rest.trim_end()));
    }
    out
}

fn indent_stderr(stderr: &str) -> String {
    stderr
        .trim_end()
        .lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Launches `launcher test_path --report=json` with cwd set to the module's
/// own directory, polling for completion and killing the child if `timeout`
/// elapses first.
fn run_one(test_path: &Path, launcher: &str, timeout: Duration, root_package: &Path) -> RunOutcome {
    let key = relative_key(test_path, root_package);
    let cwd = test_path.parent().unwrap_or_else(|| Path::new("."));

    let mut child = match Command::new(launcher)
        .arg(test_path)
        .arg(REPORT_ARG)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => return RunOutcome::error(key, format!("    failed to launch '{launcher}': {err}")),
    };

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let stdout_reader = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stdout_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let start = Instant::now();
    let timed_out = loop {
        match child.try_wait() {
            Ok(Some(_status)) => break false,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    break true;
                }
                std::thread::sleep(Duration::from_millis(TIMEOUT_POLL_MILLIS));
            }
            Err(_) => break true,
        }
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();

    if timed_out {
        return RunOutcome::error(key, "    test run's timeout expired".to_string());
    }
    if !stderr.trim().is_empty() {
        return RunOutcome::error(key, indent_stderr(&stderr));
    }
    if stdout.trim().is_empty() {
        return RunOutcome::empty();
    }
    RunOutcome::records(split_json_records(&stdout))
}

/// Runs every path in `paths` concurrently on `pool`, merging their JSON
/// records and per-module errors into a single outcome.
pub fn run_many(
    paths: &[PathBuf],
    launcher: &str,
    timeout: Duration,
    root_package: &Path,
    pool: &rayon::ThreadPool,
) -> DispatchOutcome {
    let outcomes: Vec<RunOutcome> =
        pool.install(|| paths.par_iter().map(|p| run_one(p, launcher, timeout, root_package)).collect());

    let mut result = DispatchOutcome::default();
    for outcome in outcomes {
        result.records.extend(outcome.records);
        if let Some((key, message)) = outcome.error {
            result.errors.insert(key, message);
        }
    }
    result
}
