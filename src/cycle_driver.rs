//! Outer state machine: idle-waiting, analyzing, dispatching, rendering,
//! quitting. Polls the cancellation token, then the input channel, once per
//! tick, then either runs the differ or handles an operator command, then
//! sleeps.

use crate::cancellation::CancellationToken;
use crate::protocol;
use crate::render::{CycleReport, Renderer};
use crate::watched_dir::WatchedDir;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Non-blocking source of single-character operator commands (`r`, `q`,
/// `a`). The production terminal-reading implementation is a boundary
/// concern left out of this crate; `ChannelInputSource` is the one concrete
/// implementation provided, driven by a channel for both the default binary
/// and tests.
pub trait InputSource {
    fn poll(&mut self) -> Option<char>;
}

/// Reads whatever characters have been queued onto `rx` without blocking.
pub struct ChannelInputSource {
    rx: Receiver<char>,
}

impl ChannelInputSource {
    pub fn new(rx: Receiver<char>) -> Self {
        Self { rx }
    }
}

impl InputSource for ChannelInputSource {
    fn poll(&mut self) -> Option<char> {
        self.rx.try_recv().ok()
    }
}

fn run_cycle(watched: &mut WatchedDir, pool: &rayon::ThreadPool, renderer: &mut dyn Renderer, cycle: u64, to_run: Vec<std::path::PathBuf>) {
    let start = Instant::now();
    let outcome = watched.run(&to_run, pool);
    let records = protocol::parse_records(&outcome.records);
    renderer.on_cycle(&CycleReport {
        cycle,
        records,
        errors: outcome.errors,
        elapsed: start.elapsed(),
    });
}

/// Blocks for a single line of stdin, reporting whether one arrived. EOF
/// (the operator closing stdin) is treated as a request to stop, mirroring
/// the original's `except EOFError: return True`.
fn wait_for_enter() -> bool {
    let mut line = String::new();
    matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0)
}

/// Loops rendering the Analysis only — which tests were picked and why —
/// pausing for the operator to press enter between cycles. Never dispatches
/// a test run, so it can be used to verify change detection in isolation.
pub fn run_debug_loop(watched: &mut WatchedDir, pool: &rayon::ThreadPool, renderer: &mut dyn Renderer, token: &CancellationToken) {
    loop {
        if token.is_cancelled() {
            break;
        }
        let analysis = watched.test_modules_to_run(pool);
        renderer.on_analysis(&analysis);
        if !wait_for_enter() {
            break;
        }
    }
    renderer.on_stopped();
}

/// Drives the watch loop until `q` arrives on `input` or `token` is
/// cancelled. The first cycle always renders, even when nothing is due to
/// run, so the operator sees the watcher is alive before the first real
/// change.
pub fn watch(
    watched: &mut WatchedDir,
    pool: &rayon::ThreadPool,
    renderer: &mut dyn Renderer,
    input: &mut impl InputSource,
    token: &CancellationToken,
    frequency: Duration,
) {
    let mut cycle: u64 = 0;
    let mut first = true;

    loop {
        if token.is_cancelled() {
            break;
        }

        match input.poll() {
            Some('q') => break,
            Some('r') => {
                let to_run = watched.all_test_sources();
                run_cycle(watched, pool, renderer, cycle, to_run);
                std::thread::sleep(frequency);
                continue;
            }
            Some('a') => {
                renderer.on_about();
                continue;
            }
            _ => {}
        }

        let analysis = watched.test_modules_to_run(pool);
        let to_run: Vec<_> = analysis.to_run().into_iter().collect();

        if to_run.is_empty() {
            if first {
                renderer.on_empty_first_cycle();
            }
        } else {
            cycle += 1;
            run_cycle(watched, pool, renderer, cycle, to_run);
        }
        first = false;

        std::thread::sleep(frequency);
    }

    renderer.on_stopped();
}
