// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Unit graph
//!
//! A petgraph view of parent → child edges. The forest cannot see cycles
//! (units on one are simply never reached); the graph can, and it also
//! renders the execution structure as text, DOT or Mermaid.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::errors::MerlinError;
use crate::pipeline::PipelineUnit;

/// Directed graph of units, edges pointing from parent to child
pub struct UnitGraph<'a> {
    units: &'a [PipelineUnit],
    graph: DiGraph<usize, ()>,
    id_to_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> UnitGraph<'a> {
    /// Build the graph from a flat unit list
    ///
    /// Parent ids naming no unit produce no edge; the first unit wins when
    /// ids are duplicated.
    pub fn build(units: &'a [PipelineUnit]) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();
        let mut nodes = Vec::with_capacity(units.len());

        for (idx, unit) in units.iter().enumerate() {
            let node = graph.add_node(idx);
            id_to_index.entry(unit.id.as_str()).or_insert(node);
            nodes.push(node);
        }

        for (idx, unit) in units.iter().enumerate() {
            if let Some(parent) = unit.parent_id().and_then(|p| id_to_index.get(p)) {
                graph.add_edge(*parent, nodes[idx], ());
            }
        }

        Self {
            units,
            graph,
            id_to_index,
        }
    }

    fn unit(&self, node: NodeIndex) -> &'a PipelineUnit {
        &self.units[self.graph[node]]
    }

    /// Groups of unit ids that form parent cycles
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut ids: Vec<String> = scc.iter().map(|n| self.unit(*n).id.clone()).collect();
                ids.sort();
                ids
            })
            .collect()
    }

    /// Units ordered so that every parent precedes its children
    pub fn topological_order(&self) -> Result<Vec<&'a PipelineUnit>, MerlinError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.unit(n)).collect())
            .map_err(|_| MerlinError::ParentCycle {
                units: self.cycles().into_iter().flatten().collect(),
            })
    }

    /// Direct children of a unit
    pub fn children(&self, unit_id: &str) -> Option<Vec<&'a PipelineUnit>> {
        let node = self.id_to_index.get(unit_id)?;
        let mut children: Vec<&'a PipelineUnit> = self
            .graph
            .neighbors_directed(*node, petgraph::Direction::Outgoing)
            .map(|n| self.unit(n))
            .collect();
        // petgraph yields the newest edge first
        children.reverse();
        Some(children)
    }

    /// Check if `descendant` sits below `ancestor`
    pub fn is_descendant(&self, descendant: &str, ancestor: &str) -> bool {
        let (Some(a), Some(d)) = (self.id_to_index.get(ancestor), self.id_to_index.get(descendant)) else {
            return false;
        };
        a != d && petgraph::algo::has_path_connecting(&self.graph, *a, *d, None)
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self, suffix_len: usize) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let label = self.unit(node).display_name_with(suffix_len).replace('"', "'");
            out.push_str(&format!("    u{}[\"{}\"]\n", node.index(), label));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                out.push_str(&format!("    u{} --> u{}\n", from.index(), to.index()));
            }
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self, suffix_len: usize) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in self.graph.node_indices() {
            let unit = self.unit(node);
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\"];\n",
                escape_dot(&unit.id),
                escape_dot(&unit.display_name_with(suffix_len))
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                out.push_str(&format!(
                    "    \"{}\" -> \"{}\";\n",
                    escape_dot(&self.unit(from).id),
                    escape_dot(&self.unit(to).id)
                ));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of execution order
    pub fn to_text(&self, suffix_len: usize) -> Result<String, MerlinError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, unit) in order.iter().enumerate() {
            let kind = unit
                .runner_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|_| "Unknown".to_string());

            out.push_str(&format!("{}. {} ({})", i + 1, unit.display_name_with(suffix_len), kind));

            if let Some(parent) = unit.parent_id() {
                out.push_str(&format!(" [after: {}]", parent));
            }

            out.push('\n');
        }

        Ok(out)
    }
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
