// src/graph/deps.rs

//! Data-dependency view of a step graph.
//!
//! Execution order is always declaration order; this view answers "which
//! steps feed which" for diagnostics.
//!
//! Edge direction: producer -> consumer. For a step `Train` that reads
//! `Steps.Preprocess.train` we add `Preprocess -> Train`.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::definition::StepGraph;
use crate::errors::{Result, StepgraphError};

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_graph(steps: &StepGraph) -> Self {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        for step in steps.steps() {
            index
                .entry(step.name.clone())
                .or_insert_with(|| graph.add_node(step.name.clone()));
        }

        for step in steps.steps() {
            let Some(&consumer) = index.get(&step.name) else {
                continue;
            };
            for producer in step.upstream_steps() {
                // Dangling references are left to `StepGraph::validate`.
                if let Some(&producer) = index.get(producer) {
                    graph.update_edge(producer, consumer, ());
                }
            }
        }

        Self { graph, index }
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Steps whose outputs `name` reads, in declaration order.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Steps that read outputs of `name`, in declaration order.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Steps that read no other step's outputs.
    pub fn roots(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// A producer-before-consumer order.
    ///
    /// Only a parsed, unvalidated graph can contain a cycle.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|n| self.graph[n].as_str()).collect()),
            Err(cycle) => Err(StepgraphError::DependencyCycle(format!(
                "cycle involving step '{}'",
                self.graph[cycle.node_id()]
            ))),
        }
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&node) = self.index.get(name) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(node, dir).collect();
        found.sort();
        found.into_iter().map(|n| self.graph[n].as_str()).collect()
    }
}
