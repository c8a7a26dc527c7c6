//! tdw - watches a Python package and reruns the tests affected by each change

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod analysis;
pub mod cancellation;
pub mod config;
pub mod cycle_driver;
pub mod defaults;
pub mod dispatcher;
pub mod error;
pub mod import_extractor;
pub mod parsing;
pub mod path_classifier;
pub mod protocol;
pub mod render;
pub mod snapshot;
pub mod walker;
pub mod watched_dir;

#[cfg(test)]
pub mod test_utils;

pub use analysis::Analysis;
pub use cancellation::CancellationToken;
pub use config::{Cli, Config};
pub use cycle_driver::{run_debug_loop, watch, ChannelInputSource, InputSource};
pub use dispatcher::DispatchOutcome;
pub use error::{DirNoPackage, PoolInitError};
pub use protocol::{parse_records, SuiteRecord};
pub use render::{CycleReport, PlainTextRenderer, Renderer};
pub use snapshot::Snapshot;
pub use watched_dir::WatchedDir;
