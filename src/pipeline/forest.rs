// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Unit forest
//!
//! Rebuilds the parent/child structure of a pipeline from its flat unit
//! list. Units stay in the caller's slice; the forest only stores indices.

use std::collections::HashMap;

use crate::pipeline::PipelineUnit;

/// Parent/child structure over a borrowed unit list
#[derive(Debug, Clone)]
pub struct UnitForest<'a> {
    units: &'a [PipelineUnit],
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl<'a> UnitForest<'a> {
    /// Build the forest in a single pass over `units`
    ///
    /// Roots and children keep their relative input order. Each unit index
    /// lands in exactly one slot (the root list or one parent's child list),
    /// so walking down from the roots always terminates.
    pub fn build(units: &'a [PipelineUnit]) -> Self {
        let mut roots = Vec::new();
        let mut by_parent: HashMap<&str, Vec<usize>> = HashMap::new();

        for (idx, unit) in units.iter().enumerate() {
            match unit.parent_id() {
                None => roots.push(idx),
                Some(parent) => by_parent.entry(parent).or_default().push(idx),
            }
        }

        // On duplicate ids only the first unit adopts the children.
        let children = units
            .iter()
            .map(|unit| by_parent.remove(unit.id.as_str()).unwrap_or_default())
            .collect();

        tracing::debug!(units = units.len(), roots = roots.len(), "built unit forest");

        Self {
            units,
            roots,
            children,
        }
    }

    /// The flat unit list the forest was built from
    pub fn units(&self) -> &'a [PipelineUnit] {
        self.units
    }

    /// Root chains in input order
    pub fn roots(&self) -> impl Iterator<Item = UnitChain<'_, 'a>> + '_ {
        self.roots.iter().map(move |&index| UnitChain { forest: self, index })
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of units reachable from the roots
    pub fn count_units(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<usize> = self.roots.clone();

        while let Some(idx) = stack.pop() {
            count += 1;
            stack.extend(&self.children[idx]);
        }

        count
    }

    /// Longest root-to-leaf path, counted in units
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(usize, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();

        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.children[idx].iter().map(|&c| (c, depth + 1)));
        }

        deepest
    }

    /// Depth-first pre-order walk yielding `(depth, unit)`, roots at depth 0
    pub fn walk(&self) -> Vec<(usize, &'a PipelineUnit)> {
        let mut out = Vec::with_capacity(self.units.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((idx, depth)) = stack.pop() {
            out.push((depth, &self.units[idx]));
            stack.extend(self.children[idx].iter().rev().map(|&c| (c, depth + 1)));
        }

        out
    }

    /// Units that no root reaches, in input order
    ///
    /// These have a parent id that names no unit, or sit on a parent cycle.
    pub fn unreachable(&self) -> Vec<&'a PipelineUnit> {
        let mut reached = vec![false; self.units.len()];
        let mut stack: Vec<usize> = self.roots.clone();

        while let Some(idx) = stack.pop() {
            reached[idx] = true;
            stack.extend(&self.children[idx]);
        }

        self.units
            .iter()
            .zip(reached)
            .filter(|(_, seen)| !seen)
            .map(|(unit, _)| unit)
            .collect()
    }
}

/// One node of the forest: a unit and its ordered children
#[derive(Debug, Clone, Copy)]
pub struct UnitChain<'f, 'a> {
    forest: &'f UnitForest<'a>,
    index: usize,
}

impl<'f, 'a> UnitChain<'f, 'a> {
    pub fn unit(&self) -> &'a PipelineUnit {
        &self.forest.units[self.index]
    }

    /// Direct children in input order
    pub fn children(&self) -> impl Iterator<Item = UnitChain<'f, 'a>> + 'f {
        let forest = self.forest;
        forest.children[self.index]
            .iter()
            .map(move |&index| UnitChain { forest, index })
    }

    pub fn is_leaf(&self) -> bool {
        self.forest.children[self.index].is_empty()
    }
}

/// Build the forest for a flat unit list
pub fn build_forest(units: &[PipelineUnit]) -> UnitForest<'_> {
    UnitForest::build(units)
}

/// Total number of nodes across the forest
pub fn count_units(forest: &UnitForest<'_>) -> usize {
    forest.count_units()
}

/// Depth of the deepest chain; 0 for an empty forest
pub fn max_depth(forest: &UnitForest<'_>) -> usize {
    forest.max_depth()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, parent: Option<&str>, command: &str) -> PipelineUnit {
        PipelineUnit {
            id: id.into(),
            pipeline_id: "p1".into(),
            parent_unit_id: parent.map(String::from),
            command_id: Some(command.into()),
            ..Default::default()
        }
    }

    fn ids<'f, 'a: 'f>(chains: impl Iterator<Item = UnitChain<'f, 'a>>) -> Vec<&'a str> {
        chains.map(|c| c.unit().id.as_str()).collect()
    }

    #[test]
    fn test_root_with_one_child() {
        let mut child = unit("b", Some("a"), "unused");
        child.command_id = None;
        child.query_queue_id = Some("q1".into());
        let units = vec![unit("a", None, "c1"), child];

        let forest = build_forest(&units);
        let roots: Vec<_> = forest.roots().collect();

        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].unit().id, "a");
        assert_eq!(ids(roots[0].children()), vec!["b"]);
        assert_eq!(count_units(&forest), 2);
        assert_eq!(max_depth(&forest), 2);
    }

    #[test]
    fn test_empty_forest() {
        let forest = build_forest(&[]);

        assert!(forest.is_empty());
        assert_eq!(count_units(&forest), 0);
        assert_eq!(max_depth(&forest), 0);
    }

    #[test]
    fn test_children_keep_input_order() {
        let units = vec![
            unit("c", Some("root"), "x"),
            unit("root", None, "x"),
            unit("a", Some("root"), "x"),
            unit("b", Some("root"), "x"),
        ];

        let forest = build_forest(&units);
        let root = forest.roots().next().unwrap();

        assert_eq!(ids(root.children()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_multiple_roots_and_depth() {
        let units = vec![
            unit("r1", None, "x"),
            unit("r2", None, "x"),
            unit("a", Some("r1"), "x"),
            unit("b", Some("a"), "x"),
            unit("c", Some("b"), "x"),
            unit("d", Some("r2"), "x"),
        ];

        let forest = build_forest(&units);

        assert_eq!(ids(forest.roots()), vec!["r1", "r2"]);
        assert_eq!(forest.count_units(), units.len());
        assert_eq!(forest.max_depth(), 4);
    }

    #[test]
    fn test_count_matches_len_for_valid_forests() {
        // Chain, star and mixed shapes.
        let shapes: Vec<Vec<PipelineUnit>> = vec![
            (0..50)
                .map(|i| {
                    let parent = (i > 0).then(|| format!("n{}", i - 1));
                    unit(&format!("n{}", i), parent.as_deref(), "x")
                })
                .collect(),
            std::iter::once(unit("hub", None, "x"))
                .chain((0..20).map(|i| unit(&format!("s{}", i), Some("hub"), "x")))
                .collect(),
            (0..31)
                .map(|i| {
                    let parent = (i > 0).then(|| format!("t{}", (i - 1) / 2));
                    unit(&format!("t{}", i), parent.as_deref(), "x")
                })
                .collect(),
        ];

        for units in &shapes {
            let forest = build_forest(units);
            assert_eq!(forest.count_units(), units.len());
            assert!(forest.max_depth() >= 1);
        }

        assert_eq!(build_forest(&shapes[0]).max_depth(), 50);
        assert_eq!(build_forest(&shapes[1]).max_depth(), 2);
        assert_eq!(build_forest(&shapes[2]).max_depth(), 5);
    }

    #[test]
    fn test_walk_is_preorder() {
        let units = vec![
            unit("r", None, "x"),
            unit("a", Some("r"), "x"),
            unit("b", Some("r"), "x"),
            unit("a1", Some("a"), "x"),
        ];

        let forest = build_forest(&units);
        let walked: Vec<(usize, &str)> = forest
            .walk()
            .into_iter()
            .map(|(d, u)| (d, u.id.as_str()))
            .collect();

        assert_eq!(walked, vec![(0, "r"), (1, "a"), (2, "a1"), (1, "b")]);
    }

    #[test]
    fn test_cycles_and_dangling_parents_are_unreachable() {
        let units = vec![
            unit("root", None, "x"),
            unit("x", Some("y"), "x"),
            unit("y", Some("x"), "x"),
            unit("self", Some("self"), "x"),
            unit("orphan", Some("missing"), "x"),
        ];

        let forest = build_forest(&units);
        let unreachable: Vec<&str> = forest.unreachable().iter().map(|u| u.id.as_str()).collect();

        assert_eq!(forest.count_units(), 1);
        assert_eq!(unreachable, vec!["x", "y", "self", "orphan"]);
    }

    #[test]
    fn test_duplicate_id_does_not_share_children() {
        let units = vec![
            unit("a", None, "x"),
            unit("a", None, "x"),
            unit("child", Some("a"), "x"),
        ];

        let forest = build_forest(&units);
        let roots: Vec<_> = forest.roots().collect();

        assert_eq!(roots[0].children().count(), 1);
        assert!(roots[1].is_leaf());
        assert_eq!(forest.count_units(), 3);
    }
}
