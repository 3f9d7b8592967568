//! Recursive prerequisite-tree exploration.
//!
//! For each concept the explorer asks the service two questions: is it
//! foundational, and if not, what are its direct prerequisites. Repeated
//! concepts are answered from a per-run memo table; a concept that reappears
//! on its own ancestor path is cut off as a foundational stub so cyclic
//! curricula cannot recurse forever.

use std::collections::{HashMap, HashSet};

use futures::future::BoxFuture;
use futures::FutureExt;
use kimi_async::{config::Config, Client};

use crate::{
    errors::{CallFailure, PipelineError, Result},
    prompts::{
        self, FoundationCheck, PrerequisiteList, CHECK_FOUNDATION, LIST_PREREQUISITES,
    },
    service::{ask, Ask},
    tree::{ConceptNode, StageKind},
};

/// Counters accumulated over one exploration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExploreStats {
    /// Nodes in the finished tree
    pub nodes: usize,
    /// Requests actually sent to the service
    pub service_calls: usize,
    /// Subtrees answered from the memo table
    pub memo_hits: usize,
    /// Nodes that fell back to a safe default after a failed call
    pub degraded: usize,
}

/// Builds prerequisite trees by querying the reasoning service.
pub struct Explorer<C: Config> {
    client: Client<C>,
    model: String,
    max_depth: u32,
    use_structured_calls: bool,
    memo: HashMap<String, ConceptNode>,
    in_progress: HashSet<String>,
    stats: ExploreStats,
}

impl<C: Config> Explorer<C> {
    /// Creates an explorer with the given depth ceiling.
    pub fn new(client: Client<C>, model: impl Into<String>, max_depth: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_depth,
            use_structured_calls: true,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            stats: ExploreStats::default(),
        }
    }

    /// Disables function tools; payloads are recovered from text instead.
    #[must_use]
    pub fn without_structured_calls(mut self) -> Self {
        self.use_structured_calls = false;
        self
    }

    /// Stats for the most recent run.
    #[must_use]
    pub const fn stats(&self) -> ExploreStats {
        self.stats
    }

    /// Explores `concept` down to the depth ceiling and returns its tree.
    ///
    /// State from previous runs is cleared first, so each call stands alone.
    pub async fn explore(&mut self, concept: &str) -> Result<ConceptNode> {
        self.memo.clear();
        self.in_progress.clear();
        self.stats = ExploreStats::default();

        tracing::info!(concept, max_depth = self.max_depth, "starting exploration");
        let root = self.explore_node(concept.to_string(), 0).await?;
        self.stats.nodes = root.node_count();
        tracing::info!(
            nodes = self.stats.nodes,
            service_calls = self.stats.service_calls,
            memo_hits = self.stats.memo_hits,
            degraded = self.stats.degraded,
            "exploration finished"
        );
        Ok(root)
    }

    fn explore_node(&mut self, concept: String, depth: u32) -> BoxFuture<'_, Result<ConceptNode>> {
        async move {
            let key = memo_key(&concept);

            if let Some(hit) = self.memo.get(&key).cloned() {
                self.stats.memo_hits += 1;
                tracing::debug!(%concept, depth, "memo hit");
                let mut node = hit;
                node.rebase(depth, self.max_depth);
                return Ok(node);
            }

            if self.in_progress.contains(&key) {
                // Cycle: the concept is its own (transitive) prerequisite.
                self.stats.degraded += 1;
                tracing::warn!(%concept, depth, "cycle detected; cutting off as foundational");
                let mut node = ConceptNode::foundation(&concept, depth);
                node.push_error(StageKind::Explore, "cycle detected in prerequisite chain");
                return Ok(node);
            }
            self.in_progress.insert(key.clone());

            let result = self.expand(concept, depth).await;
            self.in_progress.remove(&key);
            let node = result?;
            self.memo.insert(key, node.clone());
            Ok(node)
        }
        .boxed()
    }

    async fn expand(&mut self, concept: String, depth: u32) -> Result<ConceptNode> {
        let is_foundation = match self.check_foundation(&concept, depth).await {
            Ok(check) => check.is_foundation,
            Err(CallFailure::Degraded(reason)) => {
                // Safe default: stop expanding rather than guess prerequisites.
                self.stats.degraded += 1;
                tracing::warn!(%concept, depth, %reason, "foundation check failed; treating as foundational");
                let mut node = ConceptNode::foundation(&concept, depth);
                node.push_error(StageKind::Explore, reason);
                return Ok(node);
            }
            Err(CallFailure::Fatal(e)) => return Err(PipelineError::Kimi(e)),
        };

        if is_foundation || depth >= self.max_depth {
            if !is_foundation {
                tracing::debug!(%concept, depth, "depth ceiling reached; leaf forced foundational");
            }
            return Ok(ConceptNode::foundation(&concept, depth));
        }

        let prerequisites = match self.list_prerequisites(&concept, depth).await {
            Ok(list) => list.prerequisites,
            Err(CallFailure::Degraded(reason)) => {
                self.stats.degraded += 1;
                tracing::warn!(%concept, depth, %reason, "prerequisite listing failed; treating as foundational");
                let mut node = ConceptNode::foundation(&concept, depth);
                node.push_error(StageKind::Explore, reason);
                return Ok(node);
            }
            Err(CallFailure::Fatal(e)) => return Err(PipelineError::Kimi(e)),
        };

        let mut node = ConceptNode::new(&concept, depth);
        let mut seen = HashSet::new();
        for prereq in prerequisites {
            let trimmed = prereq.trim();
            if trimmed.is_empty() || memo_key(trimmed) == memo_key(&concept) {
                continue;
            }
            if !seen.insert(memo_key(trimmed)) {
                continue;
            }
            let child = self.explore_node(trimmed.to_string(), depth + 1).await?;
            node.prerequisites.push(child);
        }

        // A model that names no usable prerequisites has declared a foundation.
        if node.prerequisites.is_empty() {
            node.is_foundation = true;
        }
        Ok(node)
    }

    async fn check_foundation(
        &mut self,
        concept: &str,
        depth: u32,
    ) -> std::result::Result<FoundationCheck, CallFailure> {
        self.stats.service_calls += 1;
        let spec = if self.use_structured_calls {
            Ask::structured(
                CHECK_FOUNDATION,
                prompts::explorer_system(),
                prompts::foundation_prompt(concept, depth, true),
                prompts::foundation_tool(),
            )
        } else {
            Ask::unstructured(
                CHECK_FOUNDATION,
                prompts::explorer_system(),
                prompts::foundation_prompt(concept, depth, false),
            )
        };
        ask::<C, FoundationCheck>(&self.client, &self.model, spec)
            .await
            .map(|p| p.value)
    }

    async fn list_prerequisites(
        &mut self,
        concept: &str,
        depth: u32,
    ) -> std::result::Result<PrerequisiteList, CallFailure> {
        self.stats.service_calls += 1;
        let spec = if self.use_structured_calls {
            Ask::structured(
                LIST_PREREQUISITES,
                prompts::explorer_system(),
                prompts::prerequisites_prompt(concept, depth, true),
                prompts::prerequisites_tool(),
            )
        } else {
            Ask::unstructured(
                LIST_PREREQUISITES,
                prompts::explorer_system(),
                prompts::prerequisites_prompt(concept, depth, false),
            )
        };
        ask::<C, PrerequisiteList>(&self.client, &self.model, spec)
            .await
            .map(|p| p.value)
    }
}

/// Memo key: the concept string itself. Exact, case-sensitive match, so
/// "Calculus" and "calculus" are distinct concepts.
fn memo_key(concept: &str) -> String {
    concept.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_key_trims_but_keeps_case() {
        assert_eq!(memo_key("  Linear Algebra "), "Linear Algebra");
        assert_ne!(memo_key("calculus"), memo_key("Calculus"));
    }
}
