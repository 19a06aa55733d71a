// src/graph/names.rs

//! Name rules shared by steps, parameters and pipelines.
//!
//! Names end up inside dotted `Get` paths (`Steps.<name>.<attr>`), so they
//! may not contain `.` or whitespace.

use std::sync::LazyLock;

use regex::Regex;

use super::error::GraphError;

pub const MAX_NAME_LEN: usize = 64;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("static name regex"));

/// Check `name` against the naming rules, reporting it as a `kind` name
/// ("step", "parameter", "pipeline") on failure.
pub fn check_name(kind: &'static str, name: &str) -> Result<(), GraphError> {
    if name.len() <= MAX_NAME_LEN && NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(GraphError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}
