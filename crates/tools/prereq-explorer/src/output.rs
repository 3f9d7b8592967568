//! Artifact writing: the enriched tree JSON and the narrative script.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::tree::ConceptNode;

/// Paths of the artifacts written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// The enriched tree document, `<slug>_enriched.json`
    pub tree: PathBuf,
    /// The narration script, `<slug>_narrative.txt`; absent when no
    /// narrative was composed
    pub narrative: Option<PathBuf>,
}

/// Filesystem-safe slug: lowercased, alphanumerics kept, every other run
/// of characters collapsed to a single underscore.
#[must_use]
pub fn slugify(concept: &str) -> String {
    let mut slug = String::with_capacity(concept.len());
    let mut pending_sep = false;
    for ch in concept.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("concept");
    }
    slug
}

/// Writes the run's artifacts under `dir`, creating it if needed.
pub fn write_artifacts(
    dir: &Path,
    root: &ConceptNode,
    narrative: Option<&str>,
) -> Result<OutputPaths> {
    fs::create_dir_all(dir)?;
    let slug = slugify(&root.concept);

    let tree_path = dir.join(format!("{slug}_enriched.json"));
    let json = serde_json::to_string_pretty(root)?;
    fs::write(&tree_path, json)?;
    tracing::info!(path = %tree_path.display(), "wrote enriched tree");

    let narrative_path = match narrative {
        Some(text) => {
            let path = dir.join(format!("{slug}_narrative.txt"));
            fs::write(&path, text)?;
            tracing::info!(path = %path.display(), "wrote narrative script");
            Some(path)
        }
        None => None,
    };

    Ok(OutputPaths {
        tree: tree_path,
        narrative: narrative_path,
    })
}
