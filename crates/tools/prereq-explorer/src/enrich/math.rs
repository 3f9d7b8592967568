//! Mathematical enrichment: equations and definitions per node.

use std::collections::HashMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use kimi_async::{config::Config, Client};

use crate::{
    errors::{CallFailure, PipelineError, Result},
    prompts::{self, MathEnrichment, ENRICH_MATH},
    service::{ask, Ask},
    tree::{ConceptNode, StageKind},
};

/// Walks the tree pre-order, asking the service for mathematical content
/// per concept. Repeated concepts are served from a per-run cache so the
/// same concept is never enriched twice against the service.
pub struct MathEnricher<'c, C: Config> {
    client: &'c Client<C>,
    model: &'c str,
    structured: bool,
    cache: HashMap<String, MathEnrichment>,
    failures: usize,
}

impl<'c, C: Config> MathEnricher<'c, C> {
    pub fn new(client: &'c Client<C>, model: &'c str, structured: bool) -> Self {
        Self {
            client,
            model,
            structured,
            cache: HashMap::new(),
            failures: 0,
        }
    }

    /// Enriches every node in the subtree; returns the failure count.
    pub async fn enrich(&mut self, root: &mut ConceptNode) -> Result<usize> {
        self.enrich_node(root).await?;
        Ok(self.failures)
    }

    fn enrich_node<'a>(&'a mut self, node: &'a mut ConceptNode) -> BoxFuture<'a, Result<()>> {
        async move {
            if let Some(cached) = self.cache.get(&node.concept).cloned() {
                tracing::debug!(concept = %node.concept, "math cache hit");
                apply(node, &cached);
            } else {
                match self.fetch(&node.concept).await {
                    Ok(math) => {
                        apply(node, &math);
                        self.cache.insert(node.concept.clone(), math);
                    }
                    Err(CallFailure::Degraded(reason)) => {
                        self.failures += 1;
                        tracing::warn!(concept = %node.concept, %reason, "math enrichment failed");
                        node.push_error(StageKind::Math, reason);
                    }
                    Err(CallFailure::Fatal(e)) => return Err(PipelineError::Kimi(e)),
                }
            }

            for child in &mut node.prerequisites {
                self.enrich_node(child).await?;
            }
            Ok(())
        }
        .boxed()
    }

    async fn fetch(&self, concept: &str) -> std::result::Result<MathEnrichment, CallFailure> {
        let spec = if self.structured {
            Ask::structured(
                ENRICH_MATH,
                prompts::enricher_system(),
                prompts::math_prompt(concept, true),
                prompts::math_tool(),
            )
        } else {
            Ask::unstructured(
                ENRICH_MATH,
                prompts::enricher_system(),
                prompts::math_prompt(concept, false),
            )
        };
        ask::<C, MathEnrichment>(self.client, self.model, spec)
            .await
            .map(|p| p.value)
    }
}

fn apply(node: &mut ConceptNode, math: &MathEnrichment) {
    node.equations = Some(math.equations.clone());
    node.definitions = Some(math.definitions.clone());
}
