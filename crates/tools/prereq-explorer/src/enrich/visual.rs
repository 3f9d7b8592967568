//! Visual design enrichment: one scene specification per node.

use std::collections::HashMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use kimi_async::{config::Config, Client};

use crate::{
    errors::{CallFailure, PipelineError, Result},
    prompts::{self, VisualSpecPayload, DESIGN_VISUAL_SPEC},
    service::{ask, Ask},
    tree::{ConceptNode, StageKind, VisualSpec},
};

/// Walks the tree pre-order, designing a visual treatment per concept.
///
/// Each child prompt carries its parent's finished design so consecutive
/// scenes keep a continuous look. When a node's design fails, its children
/// fall back to the nearest ancestor design for continuity.
pub struct VisualDesigner<'c, C: Config> {
    client: &'c Client<C>,
    model: &'c str,
    structured: bool,
    cache: HashMap<String, VisualSpec>,
    failures: usize,
}

impl<'c, C: Config> VisualDesigner<'c, C> {
    pub fn new(client: &'c Client<C>, model: &'c str, structured: bool) -> Self {
        Self {
            client,
            model,
            structured,
            cache: HashMap::new(),
            failures: 0,
        }
    }

    /// Designs every node in the subtree; returns the failure count.
    pub async fn design(&mut self, root: &mut ConceptNode) -> Result<usize> {
        self.design_node(root, None).await?;
        Ok(self.failures)
    }

    fn design_node<'a>(
        &'a mut self,
        node: &'a mut ConceptNode,
        parent: Option<VisualSpec>,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let own = if let Some(cached) = self.cache.get(&node.concept).cloned() {
                tracing::debug!(concept = %node.concept, "visual cache hit");
                node.visual_spec = Some(cached.clone());
                Some(cached)
            } else {
                match self.fetch(&node.concept, parent.as_ref()).await {
                    Ok(spec) => {
                        node.visual_spec = Some(spec.clone());
                        self.cache.insert(node.concept.clone(), spec.clone());
                        Some(spec)
                    }
                    Err(CallFailure::Degraded(reason)) => {
                        self.failures += 1;
                        tracing::warn!(concept = %node.concept, %reason, "visual design failed");
                        node.push_error(StageKind::Visual, reason);
                        None
                    }
                    Err(CallFailure::Fatal(e)) => return Err(PipelineError::Kimi(e)),
                }
            };

            let pass_down = own.or(parent);
            for child in &mut node.prerequisites {
                self.design_node(child, pass_down.clone()).await?;
            }
            Ok(())
        }
        .boxed()
    }

    async fn fetch(
        &self,
        concept: &str,
        parent: Option<&VisualSpec>,
    ) -> std::result::Result<VisualSpec, CallFailure> {
        let spec = if self.structured {
            Ask::structured(
                DESIGN_VISUAL_SPEC,
                prompts::enricher_system(),
                prompts::visual_prompt(concept, parent, true),
                prompts::visual_tool(),
            )
        } else {
            Ask::unstructured(
                DESIGN_VISUAL_SPEC,
                prompts::enricher_system(),
                prompts::visual_prompt(concept, parent, false),
            )
        };
        ask::<C, VisualSpecPayload>(self.client, self.model, spec)
            .await
            .map(|p| p.value.into())
    }
}
