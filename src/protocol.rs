//! Decodes the JSON suite records a test module prints on `--report=json`.
//! A record that fails to parse is replaced by a synthetic failure, keeping
//! the aggregate counters monotonic instead of dropping the run silently.

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SuiteRecord {
    pub test_suite: String,
    pub tests_count: u64,
    pub fails_count: u64,
    #[serde(default)]
    pub fails: Vec<String>,
    #[serde(default)]
    pub test_logs: HashMap<String, Vec<String>>,
}

const DECODE_ERROR_NAME: &str = "json_decoding_error";

fn synthesize_decode_failure(raw: &str) -> SuiteRecord {
    SuiteRecord {
        test_suite: String::from("<undecodable>"),
        tests_count: 1,
        fails_count: 1,
        fails: vec![DECODE_ERROR_NAME.to_string()],
        test_logs: HashMap::from([(DECODE_ERROR_NAME.to_string(), vec![raw.to_string()])]),
    }
}

/// Parses every raw JSON record, substituting a synthetic failure record for
/// any piece that does not decode.
pub fn parse_records(raw_records: &[String]) -> Vec<SuiteRecord> {
    raw_records
        .iter()
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| synthesize_decode_failure(raw)))
        .collect()
}
