//! Pivot trees.
//!
//! A pivot tree groups the rows of a table by the values of its row-pivot
//! columns, one tree level per pivot. Every node keeps the set of member rows
//! beneath it and one aggregate state per output column. The root groups all
//! rows.
//!
//! Trees are maintained incrementally from `ChangeSet`s: a touched row is
//! retracted from its old path and re-inserted along its new one, and groups
//! left empty are pruned. The result is always identical to a tree built from
//! scratch over the same table state.

use crate::delta::ChangeSet;
use crate::operators::{Aggregate, AggregateState};
use crate::source::RowSource;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Reverse;
use hashbrown::HashMap;
use pivotal_core::{ColumnId, DataType, RowIndex, Value};

/// Identifier of a node inside one tree.
pub type NodeId = usize;

/// The root node always has id 0.
pub const ROOT: NodeId = 0;

/// One aggregated output column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputColumn {
    pub column: ColumnId,
    pub aggregate: Aggregate,
    pub data_type: DataType,
}

impl OutputColumn {
    pub fn new(column: ColumnId, aggregate: Aggregate, data_type: DataType) -> Self {
        Self {
            column,
            aggregate,
            data_type,
        }
    }
}

/// A group in the tree.
#[derive(Clone, Debug)]
pub struct PivotNode {
    key: Value,
    depth: usize,
    parent: Option<NodeId>,
    children: BTreeMap<Value, NodeId>,
    members: BTreeSet<RowIndex>,
    aggregates: Vec<AggregateState>,
}

impl PivotNode {
    fn new(key: Value, depth: usize, parent: Option<NodeId>, outputs: &[OutputColumn]) -> Self {
        Self {
            key,
            depth,
            parent,
            children: BTreeMap::new(),
            members: BTreeSet::new(),
            aggregates: outputs
                .iter()
                .map(|o| AggregateState::new(o.aggregate, o.data_type))
                .collect(),
        }
    }

    /// Group key at this level. Null for the root.
    #[inline]
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Depth below the root (the root is 0).
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Member rows, ascending.
    #[inline]
    pub fn members(&self) -> &BTreeSet<RowIndex> {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current aggregate values, one per output column.
    pub fn aggregate_values(&self) -> Vec<Value> {
        self.aggregates.iter().map(AggregateState::value).collect()
    }
}

/// Where a row currently sits in the tree.
#[derive(Clone, Debug)]
struct RowEntry {
    path: Vec<NodeId>,
    values: Vec<Value>,
}

/// Summary of one incremental application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeDelta {
    /// Rows whose group membership or aggregate inputs were refreshed.
    pub rows: Vec<RowIndex>,
    /// Groups created by the update.
    pub groups_created: usize,
    /// Groups pruned because they became empty.
    pub groups_removed: usize,
}

impl TreeDelta {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical description of one group, used to compare trees structurally.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSnapshot {
    pub path: Vec<Value>,
    pub members: Vec<RowIndex>,
    pub aggregates: Vec<Value>,
}

/// Incrementally maintained grouping of table rows.
#[derive(Clone, Debug)]
pub struct PivotTree {
    row_pivots: Vec<ColumnId>,
    outputs: Vec<OutputColumn>,
    nodes: Vec<Option<PivotNode>>,
    free: Vec<NodeId>,
    rows: HashMap<RowIndex, RowEntry>,
    /// Pivot and output columns; a change outside these never moves a row.
    relevant: Vec<ColumnId>,
}

impl PivotTree {
    /// Creates an empty tree holding only the root.
    pub fn new(row_pivots: Vec<ColumnId>, outputs: Vec<OutputColumn>) -> Self {
        let root = PivotNode::new(Value::Null, 0, None, &outputs);
        let mut relevant: Vec<ColumnId> = row_pivots
            .iter()
            .copied()
            .chain(outputs.iter().map(|o| o.column))
            .collect();
        relevant.sort_unstable();
        relevant.dedup();
        Self {
            row_pivots,
            outputs,
            nodes: vec![Some(root)],
            free: Vec::new(),
            rows: HashMap::new(),
            relevant,
        }
    }

    /// Builds a tree over every row of `source`.
    pub fn build(
        row_pivots: Vec<ColumnId>,
        outputs: Vec<OutputColumn>,
        source: &dyn RowSource,
    ) -> Self {
        let mut tree = Self::new(row_pivots, outputs);
        for row in 0..source.row_count() {
            tree.insert_row(row, source);
        }
        tree
    }

    #[inline]
    pub fn row_pivots(&self) -> &[ColumnId] {
        &self.row_pivots
    }

    #[inline]
    pub fn outputs(&self) -> &[OutputColumn] {
        &self.outputs
    }

    /// Columns whose changes can affect this tree.
    #[inline]
    pub fn columns(&self) -> &[ColumnId] {
        &self.relevant
    }

    /// Number of rows tracked.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of live groups, root included.
    pub fn group_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    #[inline]
    pub fn root(&self) -> &PivotNode {
        // The root slot is never freed.
        match &self.nodes[ROOT] {
            Some(node) => node,
            None => unreachable!("pivot tree root is never freed"),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&PivotNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    /// Applies a change-set, moving touched rows and adjusting aggregates.
    pub fn apply(&mut self, changes: &ChangeSet, source: &dyn RowSource) -> TreeDelta {
        let mut delta = TreeDelta::default();
        let before = self.group_count();
        let mut removed = 0;

        for (row, change) in changes.rows() {
            if row >= source.row_count() {
                continue;
            }
            let tracked = self.rows.contains_key(&row);
            if tracked && !change.touches(&self.relevant) {
                continue;
            }
            if tracked {
                removed += self.remove_row(row);
            }
            self.insert_row(row, source);
            delta.rows.push(row);
        }

        delta.groups_removed = removed;
        delta.groups_created = (self.group_count() + removed).saturating_sub(before);
        delta
    }

    /// Retracts a row from every node on its path. Returns the number of
    /// groups pruned.
    fn remove_row(&mut self, row: RowIndex) -> usize {
        let entry = match self.rows.remove(&row) {
            Some(entry) => entry,
            None => return 0,
        };

        for &id in &entry.path {
            if let Some(node) = self.nodes[id].as_mut() {
                node.members.remove(&row);
                for (state, value) in node.aggregates.iter_mut().zip(&entry.values) {
                    state.apply(value, -1);
                }
            }
        }

        let mut pruned = 0;
        for &id in entry.path.iter().skip(1).rev() {
            let (empty, parent, key) = match &self.nodes[id] {
                Some(node) => (node.is_empty(), node.parent, node.key.clone()),
                None => continue,
            };
            if !empty {
                break;
            }
            if let Some(parent) = parent.and_then(|p| self.nodes[p].as_mut()) {
                parent.children.remove(&key);
            }
            self.nodes[id] = None;
            self.free.push(id);
            pruned += 1;
        }
        pruned
    }

    /// Inserts a row along the path given by its current pivot values.
    fn insert_row(&mut self, row: RowIndex, source: &dyn RowSource) {
        let values: Vec<Value> = self
            .outputs
            .iter()
            .map(|o| source.value(o.column, row))
            .collect();

        let mut path = Vec::with_capacity(self.row_pivots.len() + 1);
        path.push(ROOT);
        let mut current = ROOT;
        for depth in 0..self.row_pivots.len() {
            let key = source.value(self.row_pivots[depth], row);
            current = self.child_or_insert(current, key, depth + 1);
            path.push(current);
        }

        for &id in &path {
            if let Some(node) = self.nodes[id].as_mut() {
                node.members.insert(row);
                for (state, value) in node.aggregates.iter_mut().zip(&values) {
                    state.apply(value, 1);
                }
            }
        }

        self.rows.insert(row, RowEntry { path, values });
    }

    fn child_or_insert(&mut self, parent: NodeId, key: Value, depth: usize) -> NodeId {
        if let Some(&id) = self.nodes[parent].as_ref().and_then(|p| p.children.get(&key)) {
            return id;
        }

        let node = PivotNode::new(key.clone(), depth, Some(parent), &self.outputs);
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        if let Some(p) = self.nodes[parent].as_mut() {
            p.children.insert(key, id);
        }
        id
    }

    /// Children of a node in display order: the null group first, then
    /// ordered keys ascending, then string keys by their smallest member row.
    pub fn ordered_children(&self, id: NodeId) -> Vec<NodeId> {
        let node = match self.node(id) {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut children: Vec<(u8, RowIndex, NodeId)> = node
            .children
            .iter()
            .map(|(key, &child)| {
                let first = self
                    .node(child)
                    .and_then(|c| c.members.first().copied())
                    .unwrap_or(RowIndex::MAX);
                match key {
                    Value::Null => (0, 0, child),
                    Value::String(_) => (2, first, child),
                    _ => (1, 0, child),
                }
            })
            .collect();
        // Stable: ordered keys keep the map's ascending order.
        children.sort_by_key(|&(class, first, _)| (class, first));
        children.into_iter().map(|(_, _, child)| child).collect()
    }

    /// Member rows of a node, most recently written first.
    pub fn ordered_members(&self, id: NodeId, source: &dyn RowSource) -> Vec<RowIndex> {
        let mut members: Vec<RowIndex> = match self.node(id) {
            Some(node) => node.members.iter().copied().collect(),
            None => return Vec::new(),
        };
        members.sort_by_key(|&row| (Reverse(source.epoch(row)), Reverse(row)));
        members
    }

    /// Group key path from the root down to `id`. Empty for the root.
    pub fn path(&self, id: NodeId) -> Vec<Value> {
        let mut path = Vec::new();
        let mut current = self.node(id);
        while let Some(node) = current {
            match node.parent {
                Some(parent) => {
                    path.push(node.key.clone());
                    current = self.node(parent);
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// All live nodes in depth-first display order, root first.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.group_count());
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.ordered_children(id);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Structural snapshot in display order.
    pub fn snapshot(&self) -> Vec<GroupSnapshot> {
        self.walk()
            .into_iter()
            .filter_map(|id| {
                self.node(id).map(|node| GroupSnapshot {
                    path: self.path(id),
                    members: node.members.iter().copied().collect(),
                    aggregates: node.aggregate_values(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn source() -> MemorySource {
        // columns: 0 = x (int), 1 = y (string)
        MemorySource::new(vec![
            vec![Value::Int64(1), Value::from("a")],
            vec![Value::Int64(2), Value::from("b")],
            vec![Value::Int64(3), Value::from("a")],
            vec![Value::Int64(4), Value::from("c")],
        ])
    }

    fn outputs() -> Vec<OutputColumn> {
        vec![
            OutputColumn::new(0, Aggregate::Sum, DataType::Int64),
            OutputColumn::new(1, Aggregate::Count, DataType::String),
        ]
    }

    #[test]
    fn test_flat_tree_is_root_only() {
        let src = source();
        let tree = PivotTree::build(vec![], outputs(), &src);
        assert_eq!(tree.group_count(), 1);
        assert_eq!(tree.root().len(), 4);
        assert_eq!(
            tree.root().aggregate_values(),
            vec![Value::Int64(10), Value::Int64(4)]
        );
    }

    #[test]
    fn test_build_groups() {
        let src = source();
        let tree = PivotTree::build(vec![1], outputs(), &src);
        assert_eq!(tree.group_count(), 4);

        let children = tree.ordered_children(ROOT);
        let keys: Vec<Value> = children
            .iter()
            .map(|&id| tree.node(id).unwrap().key().clone())
            .collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b"), Value::from("c")]);

        let a = tree.node(children[0]).unwrap();
        assert_eq!(a.aggregate_values(), vec![Value::Int64(4), Value::Int64(2)]);
        assert_eq!(tree.path(children[0]), vec![Value::from("a")]);
    }

    #[test]
    fn test_string_keys_order_by_first_member() {
        let src = MemorySource::new(vec![
            vec![Value::Int64(1), Value::from("z")],
            vec![Value::Int64(2), Value::from("m")],
            vec![Value::Int64(3), Value::Null],
        ]);
        let tree = PivotTree::build(vec![1], outputs(), &src);
        let keys: Vec<Value> = tree
            .ordered_children(ROOT)
            .iter()
            .map(|&id| tree.node(id).unwrap().key().clone())
            .collect();
        assert_eq!(keys, vec![Value::Null, Value::from("z"), Value::from("m")]);
    }

    #[test]
    fn test_numeric_keys_ascending() {
        let src = MemorySource::new(vec![
            vec![Value::Int64(3), Value::from("a")],
            vec![Value::Int64(1), Value::from("a")],
            vec![Value::Int64(2), Value::from("a")],
        ]);
        let tree = PivotTree::build(vec![0], outputs(), &src);
        let keys: Vec<Value> = tree
            .ordered_children(ROOT)
            .iter()
            .map(|&id| tree.node(id).unwrap().key().clone())
            .collect();
        assert_eq!(keys, vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
    }

    #[test]
    fn test_move_row_between_groups() {
        let mut src = source();
        let mut tree = PivotTree::build(vec![1], outputs(), &src);

        src.set(1, 3, Value::from("a"), 2);
        let mut cs = ChangeSet::new(2);
        cs.record_cell(3, 1);

        let delta = tree.apply(&cs, &src);
        assert_eq!(delta.rows, vec![3]);
        assert_eq!(delta.groups_removed, 1);
        assert_eq!(delta.groups_created, 0);
        assert_eq!(tree.group_count(), 3);
        assert_eq!(
            tree.snapshot(),
            PivotTree::build(vec![1], outputs(), &src).snapshot()
        );
    }

    #[test]
    fn test_insert_creates_group() {
        let mut src = source();
        let mut tree = PivotTree::build(vec![1], outputs(), &src);

        let row = src.push(vec![Value::Int64(9), Value::from("d")], 2);
        let mut cs = ChangeSet::new(2);
        cs.record_insert(row);
        cs.record_cell(row, 0);
        cs.record_cell(row, 1);

        let delta = tree.apply(&cs, &src);
        assert_eq!(delta.groups_created, 1);
        assert_eq!(tree.root().aggregate_values()[0], Value::Int64(19));
        assert_eq!(
            tree.snapshot(),
            PivotTree::build(vec![1], outputs(), &src).snapshot()
        );
    }

    #[test]
    fn test_irrelevant_change_is_skipped() {
        let src = source();
        let mut tree = PivotTree::build(vec![], vec![OutputColumn::new(0, Aggregate::Sum, DataType::Int64)], &src);

        let mut cs = ChangeSet::new(2);
        cs.record_cell(0, 1);
        assert!(tree.apply(&cs, &src).is_empty());
    }

    #[test]
    fn test_ordered_members_by_epoch() {
        let mut src = source();
        let tree = PivotTree::build(vec![], outputs(), &src);
        assert_eq!(tree.ordered_members(ROOT, &src), vec![3, 2, 1, 0]);

        src.set(0, 0, Value::Int64(5), 2);
        assert_eq!(tree.ordered_members(ROOT, &src), vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_walk_is_depth_first() {
        let src = MemorySource::new(vec![
            vec![Value::Int64(1), Value::from("a")],
            vec![Value::Int64(2), Value::from("a")],
            vec![Value::Int64(1), Value::from("b")],
        ]);
        let tree = PivotTree::build(vec![1, 0], outputs(), &src);
        let paths: Vec<Vec<Value>> = tree.walk().into_iter().map(|id| tree.path(id)).collect();
        assert_eq!(
            paths,
            vec![
                vec![],
                vec![Value::from("a")],
                vec![Value::from("a"), Value::Int64(1)],
                vec![Value::from("a"), Value::Int64(2)],
                vec![Value::from("b")],
                vec![Value::from("b"), Value::Int64(1)],
            ]
        );
    }
}
