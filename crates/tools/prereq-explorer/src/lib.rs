//! # `prereq-explorer`
//!
//! Builds a prerequisite tree for a technical concept by recursively asking
//! a reasoning service what a learner must already understand, then enriches
//! the tree with mathematical content, per-scene visual designs, and one
//! continuous narration script.
//!
//! The pipeline is degradation-tolerant: a failed call affects only its
//! node, which falls back to a safe default and records the failure in the
//! tree itself. Only configuration errors (no credentials) abort a run.
//!
//! ```no_run
//! use kimi_async::Client;
//! use prereq_explorer::{enrich::EnrichmentPipeline, explorer::Explorer, output};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = "kimi-k2-0905-preview";
//! let mut explorer = Explorer::new(Client::new(), model, 3);
//! let mut tree = explorer.explore("Fourier transform").await?;
//!
//! let run = EnrichmentPipeline::new(Client::new(), model).run(&mut tree).await?;
//! let narrative = run.narrative.as_ref().map(|n| n.text.as_str());
//! output::write_artifacts("output".as_ref(), &tree, narrative)?;
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod errors;
pub mod explorer;
pub mod output;
pub mod parse;
pub mod prompts;
pub mod service;
pub mod tree;

pub use enrich::{EnrichStats, EnrichmentPipeline, Narrative, PipelineRun};
pub use errors::{CallFailure, PipelineError, Result};
pub use explorer::{ExploreStats, Explorer};
pub use tree::{ConceptNode, NodeError, StageKind, VisualSpec};
