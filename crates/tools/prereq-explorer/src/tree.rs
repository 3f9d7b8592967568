//! The concept tree data model.
//!
//! A [`ConceptNode`] is a recursive record: one topic plus the topics a
//! learner should understand first. Enrichment stages add fields in place;
//! nothing is ever removed, so the tree is append-only and its final state
//! serializes to the output JSON document.

use serde::{Deserialize, Serialize};

/// Pipeline stage that produced a degradation record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Explore,
    Math,
    Visual,
    Narrative,
}

/// A recorded per-node failure. Kept in the tree (and serialized) so the
/// output document shows exactly which nodes were under-explored or
/// under-enriched, rather than only a console log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeError {
    pub stage: StageKind,
    pub message: String,
}

/// Visual design produced for one node by the visual stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VisualSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_movement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// One topic in the prerequisite tree.
///
/// `concept` doubles as the de-duplication key: exact, case-sensitive
/// string match. Enrichment fields are `None` until their stage has run;
/// absent means "not yet enriched", never "enriched but empty".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptNode {
    pub concept: String,
    pub depth: u32,
    pub is_foundation: bool,
    /// Direct prerequisites in discovery order
    #[serde(default)]
    pub prerequisites: Vec<ConceptNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_spec: Option<VisualSpec>,
    /// Set only on the tree root, by the narrative stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichment_errors: Vec<NodeError>,
}

impl ConceptNode {
    /// A fresh, unexplored node.
    #[must_use]
    pub fn new(concept: impl Into<String>, depth: u32) -> Self {
        Self {
            concept: concept.into(),
            depth,
            is_foundation: false,
            prerequisites: Vec::new(),
            equations: None,
            definitions: None,
            visual_spec: None,
            narrative: None,
            enrichment_errors: Vec::new(),
        }
    }

    /// A foundational leaf: terminal, never explored further.
    #[must_use]
    pub fn foundation(concept: impl Into<String>, depth: u32) -> Self {
        let mut node = Self::new(concept, depth);
        node.is_foundation = true;
        node
    }

    /// Records a degradation for this node.
    pub fn push_error(&mut self, stage: StageKind, message: impl Into<String>) {
        self.enrichment_errors.push(NodeError {
            stage,
            message: message.into(),
        });
    }

    /// Total number of nodes in this subtree (including self).
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .prerequisites
            .iter()
            .map(Self::node_count)
            .sum::<usize>()
    }

    /// The largest `depth` value anywhere in this subtree.
    #[must_use]
    pub fn deepest(&self) -> u32 {
        self.prerequisites
            .iter()
            .map(Self::deepest)
            .max()
            .unwrap_or(self.depth)
    }

    /// Number of nodes carrying at least one degradation record.
    #[must_use]
    pub fn degraded_count(&self) -> usize {
        usize::from(!self.enrichment_errors.is_empty())
            + self
                .prerequisites
                .iter()
                .map(Self::degraded_count)
                .sum::<usize>()
    }

    /// Re-roots a memoized subtree at a new position.
    ///
    /// Depths are rewritten so every child sits one level below its parent,
    /// and anything that would cross `max_depth` is truncated into a
    /// foundational leaf, keeping both tree invariants intact wherever the
    /// cached subtree is spliced in.
    pub fn rebase(&mut self, depth: u32, max_depth: u32) {
        self.depth = depth;
        if depth >= max_depth {
            self.prerequisites.clear();
            self.is_foundation = true;
            return;
        }
        for child in &mut self.prerequisites {
            child.rebase(depth + 1, max_depth);
        }
    }

    /// Plain-text outline of the tree for verbose console output.
    #[must_use]
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        for _ in 0..self.depth {
            out.push_str("  ");
        }
        out.push_str("- ");
        out.push_str(&self.concept);
        if self.is_foundation {
            out.push_str(" [foundation]");
        }
        out.push('\n');
        for child in &self.prerequisites {
            child.render_into(out);
        }
    }

    /// Serializes the tree to a JSON value (the output document layout).
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Reconstructs a tree from its JSON value form.
    pub fn from_value(v: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(v)
    }
}
