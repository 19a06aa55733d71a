#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub use stepgraph_test_utils::builders;
pub use stepgraph_test_utils::init_tracing;

/// Write `contents` to a temp file with the given suffix (e.g. ".toml").
pub fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("pipeline-")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    write!(file, "{contents}").unwrap();
    file
}
