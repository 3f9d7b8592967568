//! Narrative composition: one continuous script for the whole tree.

use std::collections::HashSet;

use kimi_async::{config::Config, Client};

use crate::{
    errors::{CallFailure, PipelineError, Result},
    prompts::{self, NarrativePayload, COMPOSE_NARRATIVE},
    service::{ask, Ask},
    tree::{ConceptNode, StageKind},
};

/// A composed narration plus its derived metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    /// Continuous narration text, foundations first
    pub text: String,
    /// Total running time in seconds
    pub total_duration_secs: f64,
    /// Number of scenes covered
    pub scene_count: u32,
    /// Concepts in teaching order (post-order, deduplicated)
    pub concept_order: Vec<String>,
}

/// Issues a single composition call over the tree outline.
pub struct NarrativeComposer<'c, C: Config> {
    client: &'c Client<C>,
    model: &'c str,
    structured: bool,
}

impl<'c, C: Config> NarrativeComposer<'c, C> {
    pub fn new(client: &'c Client<C>, model: &'c str, structured: bool) -> Self {
        Self {
            client,
            model,
            structured,
        }
    }

    /// Composes the narrative and stores it on the root node.
    ///
    /// Returns `None` when the single composition call degrades; the root
    /// then carries a narrative-stage error record instead of a script.
    pub async fn compose(&self, root: &mut ConceptNode) -> Result<Option<Narrative>> {
        let order = teaching_order(root);
        let outline = root.render_outline();

        let spec = if self.structured {
            Ask::structured(
                COMPOSE_NARRATIVE,
                prompts::enricher_system(),
                prompts::narrative_prompt(&root.concept, &outline, true),
                prompts::narrative_tool(),
            )
        } else {
            Ask::unstructured(
                COMPOSE_NARRATIVE,
                prompts::enricher_system(),
                prompts::narrative_prompt(&root.concept, &outline, false),
            )
        };

        let payload = match ask::<C, NarrativePayload>(self.client, self.model, spec).await {
            Ok(p) => p.value,
            Err(CallFailure::Degraded(reason)) => {
                tracing::warn!(concept = %root.concept, %reason, "narrative composition failed");
                root.push_error(StageKind::Narrative, reason);
                return Ok(None);
            }
            Err(CallFailure::Fatal(e)) => return Err(PipelineError::Kimi(e)),
        };

        root.narrative = Some(payload.narrative.clone());

        let narrative = Narrative {
            text: payload.narrative,
            total_duration_secs: payload
                .total_duration_secs
                .unwrap_or_else(|| summed_durations(root)),
            scene_count: payload.scene_count.unwrap_or_else(|| {
                u32::try_from(order.len()).unwrap_or(u32::MAX)
            }),
            concept_order: order,
        };
        Ok(Some(narrative))
    }
}

/// Unique concepts in teaching order: post-order traversal, so every
/// prerequisite precedes the concept that needs it; first sighting wins.
#[must_use]
pub fn teaching_order(root: &ConceptNode) -> Vec<String> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    collect_post_order(root, &mut order, &mut seen);
    order
}

fn collect_post_order(node: &ConceptNode, order: &mut Vec<String>, seen: &mut HashSet<String>) {
    for child in &node.prerequisites {
        collect_post_order(child, order, seen);
    }
    if seen.insert(node.concept.clone()) {
        order.push(node.concept.clone());
    }
}

fn summed_durations(node: &ConceptNode) -> f64 {
    let own = node
        .visual_spec
        .as_ref()
        .and_then(|v| v.duration_secs)
        .unwrap_or(0.0);
    own + node.prerequisites.iter().map(summed_durations).sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teaching_order_is_post_order_and_deduplicated() {
        let mut root = ConceptNode::new("X", 0);
        let mut b = ConceptNode::new("B", 1);
        b.prerequisites.push(ConceptNode::foundation("A", 2));
        root.prerequisites.push(b);
        root.prerequisites.push(ConceptNode::foundation("A", 1));

        assert_eq!(teaching_order(&root), vec!["A", "B", "X"]);
    }

    #[test]
    fn durations_sum_over_visual_specs() {
        let mut root = ConceptNode::new("X", 0);
        root.visual_spec = Some(crate::tree::VisualSpec {
            duration_secs: Some(10.0),
            ..Default::default()
        });
        let mut a = ConceptNode::foundation("A", 1);
        a.visual_spec = Some(crate::tree::VisualSpec {
            duration_secs: Some(5.5),
            ..Default::default()
        });
        root.prerequisites.push(a);

        assert!((summed_durations(&root) - 15.5).abs() < f64::EPSILON);
    }
}
