use std::collections::{BTreeMap, BTreeSet};

use stepgraph::graph::{PlaceholderExecutor, ResolvedStep, StepExecutor, StepGraph};

/// A fake executor that:
/// - records which steps were "run", with their resolved arguments
/// - reports a placeholder for every attribute the graph reads, except the
///   ones it was told to withhold.
pub struct RecordingExecutor {
    inner: PlaceholderExecutor,
    withheld: BTreeSet<(String, String)>,
    pub executed: Vec<ResolvedStep>,
}

impl RecordingExecutor {
    pub fn for_graph(graph: &StepGraph) -> Self {
        Self {
            inner: PlaceholderExecutor::for_graph(graph),
            withheld: BTreeSet::new(),
            executed: Vec::new(),
        }
    }

    /// Do not report `attribute` for `step`.
    pub fn withhold(mut self, step: &str, attribute: &str) -> Self {
        self.withheld
            .insert((step.to_string(), attribute.to_string()));
        self
    }

    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|s| s.name.as_str()).collect()
    }
}

impl StepExecutor for RecordingExecutor {
    fn execute(&mut self, step: &ResolvedStep) -> BTreeMap<String, String> {
        self.executed.push(step.clone());
        let mut outputs = self.inner.execute(step);
        outputs.retain(|attr, _| !self.withheld.contains(&(step.name.clone(), attr.clone())));
        outputs
    }
}
