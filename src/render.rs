//! Rendering boundary: turns a cycle's results into user-facing output.
//! Kept as a trait so the concrete visual design stays swappable; the
//! default implementation is plain `println!` text, no ANSI, no redraw.

use crate::analysis::Analysis;
use crate::protocol::SuiteRecord;
use std::collections::HashMap;
use std::time::Duration;

/// Everything gathered during one completed cycle, ready to render.
pub struct CycleReport {
    pub cycle: u64,
    pub records: Vec<SuiteRecord>,
    pub errors: HashMap<String, String>,
    pub elapsed: Duration,
}

pub trait Renderer {
    fn on_cycle(&mut self, report: &CycleReport);
    fn on_empty_first_cycle(&mut self);
    fn on_analysis(&mut self, analysis: &Analysis);
    fn on_about(&mut self);
    fn on_stopped(&mut self);
}

/// Grounded in the teacher's plain-`println!` console output: no color, no
/// redraw, one line per test suite plus a failure summary.
#[derive(Default)]
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    fn on_cycle(&mut self, report: &CycleReport) {
        let tests_run: u64 = report.records.iter().map(|r| r.tests_count).sum();
        let fails_count: u64 = report.records.iter().map(|r| r.fails_count).sum();

        println!("--- cycle {} ({:.2}s) ---", report.cycle, report.elapsed.as_secs_f64());
        for record in &report.records {
            println!("  {}: {}/{} passed", record.test_suite, record.tests_count - record.fails_count, record.tests_count);
            for fail in &record.fails {
                println!("    FAIL {fail}");
                if let Some(log) = record.test_logs.get(fail) {
                    for line in log {
                        println!("      {line}");
                    }
                }
            }
        }
        for (module, error) in &report.errors {
            println!("  {module}: ERROR");
            println!("{error}");
        }
        println!("{tests_run} run, {fails_count} failed, {} errored", report.errors.len());
    }

    fn on_empty_first_cycle(&mut self) {
        println!("tdw: no tests found yet, watching for changes...");
    }

    fn on_analysis(&mut self, analysis: &Analysis) {
        println!("tdw: debug analysis");
        println!("  modified tests: {}", analysis.mod_tt.len());
        for (prod, tests) in &analysis.mod_pp {
            println!("  modified production {}: {} dependent test(s)", prod.display(), tests.len());
        }
    }

    fn on_about(&mut self) {
        println!("tdw: watches a Python package and reruns the tests affected by each change");
        println!("  [r]un all test modules   [a]bout   [q]uit");
    }

    fn on_stopped(&mut self) {
        println!("tdw: gracefully stopped");
    }
}
