//! Enrichment stages layered over a finished prerequisite tree.
//!
//! Each stage is independent and idempotent over its own fields: math adds
//! equations and definitions, visual adds per-node scene designs, narrative
//! composes one script for the whole tree. A stage failure degrades the
//! affected node (recorded in `enrichment_errors`) and never unwinds work
//! another stage already did.

pub mod math;
pub mod narrative;
pub mod visual;

use kimi_async::config::Config;
use kimi_async::Client;

use crate::errors::Result;
use crate::tree::ConceptNode;

pub use math::MathEnricher;
pub use narrative::{Narrative, NarrativeComposer};
pub use visual::VisualDesigner;

/// Per-stage failure counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Nodes the math stage could not enrich
    pub math_failures: usize,
    /// Nodes the visual stage could not design
    pub visual_failures: usize,
    /// 1 when narrative composition failed, else 0
    pub narrative_failures: usize,
}

/// Outcome of a full enrichment run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// The composed narrative, when that stage succeeded
    pub narrative: Option<Narrative>,
    /// Failure counters across all stages
    pub stats: EnrichStats,
}

/// Runs all enrichment stages in order: math, visual, narrative.
pub struct EnrichmentPipeline<C: Config> {
    client: Client<C>,
    model: String,
    use_structured_calls: bool,
}

impl<C: Config> EnrichmentPipeline<C> {
    /// Creates a pipeline bound to one client and model.
    pub fn new(client: Client<C>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            use_structured_calls: true,
        }
    }

    /// Disables function tools for every stage.
    #[must_use]
    pub fn without_structured_calls(mut self) -> Self {
        self.use_structured_calls = false;
        self
    }

    /// Enriches `root` in place and returns the run summary.
    pub async fn run(&self, root: &mut ConceptNode) -> Result<PipelineRun> {
        let mut stats = EnrichStats::default();

        let mut math = MathEnricher::new(&self.client, &self.model, self.use_structured_calls);
        stats.math_failures = math.enrich(root).await?;

        let mut visual = VisualDesigner::new(&self.client, &self.model, self.use_structured_calls);
        stats.visual_failures = visual.design(root).await?;

        let composer = NarrativeComposer::new(&self.client, &self.model, self.use_structured_calls);
        let narrative = match composer.compose(root).await? {
            Some(n) => Some(n),
            None => {
                stats.narrative_failures = 1;
                None
            }
        };

        Ok(PipelineRun { narrative, stats })
    }
}
