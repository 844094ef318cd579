//! Authored node shapes.
//!
//! An authored element can be written in three ways:
//!
//! ```yaml
//! - Lichtcircuit                      # bare type name
//! - type: Lichtcircuit                # canonical mapping
//!   props: {aantal_lichtpunten: 2}
//! - Lichtcircuit:                     # type name as key
//!     aantal_lichtpunten: 2
//!     children: [...]
//! ```
//!
//! [`NodeForm`] records which of those was used; [`CanonicalNode`] is the single
//! shape the flattener works on.

use serde_json::{Map, Value};

use crate::ir::flat::value_text;

/// How an authored node was written, decided once before any defaulting.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeForm {
    /// `"Lichtcircuit"`
    Bare(String),
    /// A mapping that carries an explicit `type` key.
    Canonical(Map<String, Value>),
    /// `{Lichtcircuit: {...}}` where the key is a known type name. The body is
    /// whatever value sat under the key (usually a mapping, possibly null).
    KeyedShorthand { type_name: String, body: Value },
    /// Anything else. Passed through so unknown shapes do not abort a run.
    Opaque(Value),
}

/// A node with shorthand removed. Defaults are not merged yet.
///
/// A sequence number can be authored in two places with different effects
/// under a grouping parent: `nr` here comes from a canonical mapping's
/// top-level key and keeps the node out of its parent's numbering, while an
/// `nr` inside `props` (the keyed form puts it there) overrides the value but
/// still takes its turn in the numbering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalNode {
    pub node_type: String,
    /// Top-level sequence number of a canonical mapping, in text form.
    pub nr: Option<String>,
    pub props: Map<String, Value>,
    pub children: Vec<CanonicalNode>,
}

impl CanonicalNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        CanonicalNode {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_nr(mut self, nr: impl Into<String>) -> Self {
        self.nr = Some(nr.into());
        self
    }

    pub fn with_children(mut self, children: Vec<CanonicalNode>) -> Self {
        self.children = children;
        self
    }

    /// Whether a grouping parent skips this node when handing out numbers.
    pub fn skips_numbering(&self) -> bool {
        self.nr.is_some()
    }

    /// Sequence number authored inside `props`, in text form.
    pub fn prop_nr(&self) -> Option<String> {
        self.props
            .get("nr")
            .filter(|v| !v.is_null())
            .map(value_text)
    }
}
