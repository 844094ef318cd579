//! Group letters and cross-references.
//!
//! Every grouping node (a `Kring`) gets a letter in traversal order using
//! bijective base-26: `A..Z, AA..AZ, BA..`. A node that carries a non-empty
//! `nr` while some group is open registers `<letter>.<nr>` so site-plan layers
//! can point at it by a stable, human readable name.
//!
//! The open group is always the most recently opened one in traversal order.
//! It is not closed when its subtree ends, so the flattener and a linear scan
//! over the record list derive identical names.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ir::flat::FlatRecord;
use crate::schema::GROUP_TYPE;

/// `<letter>.<nr>` → record id, in registration order.
pub type CrossReferences = IndexMap<String, u32>;

/// Bijective base-26 label for the `counter`-th group (0 → `A`, 26 → `AA`).
pub fn group_name(counter: usize) -> String {
    let mut letters = Vec::new();
    let mut n = counter + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Tracks the group counter and the currently open group during a walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupCursor {
    counter: usize,
    current: Option<String>,
}

impl GroupCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visit a node; returns the new group name if the node opens a group.
    pub fn visit(&mut self, node_type: &str) -> Option<String> {
        if node_type != GROUP_TYPE {
            return None;
        }
        let name = group_name(self.counter);
        self.counter += 1;
        self.current = Some(name.clone());
        Some(name)
    }

    /// Reference key for `nr` under the open group, if any.
    pub fn reference_for(&self, nr: &str) -> Option<String> {
        match &self.current {
            Some(group) if !nr.is_empty() => Some(format!("{group}.{nr}")),
            _ => None,
        }
    }
}

/// Mutable state threaded through one flattening walk.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalState {
    pub next_id: u32,
    pub groups: GroupCursor,
}

impl TraversalState {
    pub fn new() -> Self {
        TraversalState {
            next_id: 1,
            groups: GroupCursor::new(),
        }
    }

    pub fn reserve_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for TraversalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Group names and references recovered from an existing record list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupScan {
    /// Record id → letter, for records that open a group.
    pub openings: HashMap<u32, String>,
    /// Record id → `<letter>.<nr>`.
    pub references: HashMap<u32, String>,
}

impl GroupScan {
    /// Inverse lookup: `<letter>.<nr>` → id.
    pub fn cross_references(&self, records: &[FlatRecord]) -> CrossReferences {
        records
            .iter()
            .filter_map(|r| self.references.get(&r.id).map(|key| (key.clone(), r.id)))
            .collect()
    }
}

/// Replay the group walk over records in stored order.
pub fn scan_groups(records: &[FlatRecord]) -> GroupScan {
    let mut cursor = GroupCursor::new();
    let mut scan = GroupScan::default();
    for record in records {
        if let Some(name) = cursor.visit(record.node_type()) {
            scan.openings.insert(record.id, name);
        }
        if let Some(reference) = cursor.reference_for(&record.nr()) {
            scan.references.insert(record.id, reference);
        }
    }
    scan
}
