//! Prerequisite graph for work items
//!
//! Guards prerequisite edits against cycles. Uses petgraph for graph operations.
//! Ids that are not in the store are external dependencies and never
//! become nodes.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::object::TrellisObject;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding prerequisite would create a cycle: {0} -> {1}")]
    CycleDetected(String, String),

    #[error("Object not found in prerequisite graph: {0}")]
    ObjectNotFound(String),

    #[error("Self-prerequisite not allowed: {0}")]
    SelfDependency(String),
}

/// A prerequisite graph over object ids
#[derive(Debug, Default)]
pub struct PrerequisiteGraph {
    /// Edge direction: prerequisite -> dependent
    graph: DiGraph<String, ()>,

    /// Map from id to node index
    node_map: HashMap<String, NodeIndex>,
}

impl PrerequisiteGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a collection of objects
    pub fn from_objects<'a>(
        objects: impl IntoIterator<Item = &'a TrellisObject>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        let objects: Vec<_> = objects.into_iter().collect();
        for object in &objects {
            graph.add_object(&object.id);
        }

        for object in &objects {
            for prerequisite in &object.prerequisites {
                if graph.contains(prerequisite) {
                    graph.add_prerequisite(&object.id, prerequisite)?;
                }
            }
        }

        Ok(graph)
    }

    /// Adds an object node
    pub fn add_object(&mut self, id: &str) {
        if !self.node_map.contains_key(id) {
            let idx = self.graph.add_node(id.to_string());
            self.node_map.insert(id.to_string(), idx);
        }
    }

    /// Adds an edge: `dependent` requires `prerequisite`
    pub fn add_prerequisite(&mut self, dependent: &str, prerequisite: &str) -> Result<(), GraphError> {
        if dependent == prerequisite {
            return Err(GraphError::SelfDependency(dependent.to_string()));
        }

        let dependent_idx = *self
            .node_map
            .get(dependent)
            .ok_or_else(|| GraphError::ObjectNotFound(dependent.to_string()))?;

        let prerequisite_idx = *self
            .node_map
            .get(prerequisite)
            .ok_or_else(|| GraphError::ObjectNotFound(prerequisite.to_string()))?;

        let edge = self.graph.add_edge(prerequisite_idx, dependent_idx, ());

        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(GraphError::CycleDetected(
                dependent.to_string(),
                prerequisite.to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the direct prerequisites of an object that are in the graph
    #[cfg(test)]
    pub fn prerequisites(&self, id: &str) -> Vec<String> {
        self.neighbors(id, petgraph::Direction::Incoming)
    }

    /// Returns the objects that directly require this one
    #[cfg(test)]
    pub fn dependents(&self, id: &str) -> Vec<String> {
        self.neighbors(id, petgraph::Direction::Outgoing)
    }

    #[cfg(test)]
    fn neighbors(&self, id: &str, direction: petgraph::Direction) -> Vec<String> {
        let Some(idx) = self.node_map.get(id) else {
            return vec![];
        };

        self.graph
            .neighbors_directed(*idx, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    /// Returns true if the graph contains the id
    pub fn contains(&self, id: &str) -> bool {
        self.node_map.contains_key(id)
    }

    /// Returns the number of nodes
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
