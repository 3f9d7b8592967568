//! Prompt construction and the typed payloads each stage expects back.
//!
//! Every stage has a tool name, a schema-derived tool definition, and a
//! prompt builder. Prompts embed the concept on its own `Concept:` line so
//! transcripts (and test assertions) can identify which node a request was
//! for.

use kimi_async::types::tools::{schema::tool_from_schema, Tool, ToolChoice};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tree::VisualSpec;

/// Tool name for the foundation check.
pub const CHECK_FOUNDATION: &str = "check_foundation";
/// Tool name for prerequisite listing.
pub const LIST_PREREQUISITES: &str = "list_prerequisites";
/// Tool name for mathematical enrichment.
pub const ENRICH_MATH: &str = "enrich_math";
/// Tool name for visual specification design.
pub const DESIGN_VISUAL_SPEC: &str = "design_visual_spec";
/// Tool name for narrative composition.
pub const COMPOSE_NARRATIVE: &str = "compose_narrative";

/// Answer to "is this concept foundational?".
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FoundationCheck {
    /// True when the concept needs no further decomposition
    pub is_foundation: bool,
    /// Optional one-sentence justification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Direct prerequisites of a concept.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrerequisiteList {
    /// Concept names, most fundamental first
    pub prerequisites: Vec<String>,
}

/// Mathematical content for one concept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MathEnrichment {
    /// Key equations in LaTeX
    #[serde(default)]
    pub equations: Vec<String>,
    /// Short formal definitions
    #[serde(default)]
    pub definitions: Vec<String>,
}

/// Visual treatment for one concept, matching [`VisualSpec`] field for field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualSpecPayload {
    /// What appears on screen
    pub visual_description: String,
    /// Palette, named colors or hex
    pub color_scheme: String,
    /// How elements move or transform
    pub animation_description: String,
    /// Camera framing and movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_movement: Option<String>,
    /// Suggested scene length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

impl From<VisualSpecPayload> for VisualSpec {
    fn from(p: VisualSpecPayload) -> Self {
        Self {
            visual_description: Some(p.visual_description),
            color_scheme: Some(p.color_scheme),
            animation_description: Some(p.animation_description),
            camera_movement: p.camera_movement,
            duration_secs: p.duration_secs,
        }
    }
}

/// Narrative script for the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NarrativePayload {
    /// The narration text, foundations first
    pub narrative: String,
    /// Total running time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<f64>,
    /// Number of scenes the narration covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_count: Option<u32>,
}

/// Builds the single tool plus forced tool choice for a stage.
#[must_use]
pub fn stage_tooling<T: JsonSchema>(name: &str, description: &str) -> (Vec<Tool>, ToolChoice) {
    (
        vec![tool_from_schema::<T>(name, description)],
        ToolChoice::tool(name),
    )
}

/// Tool definition for [`CHECK_FOUNDATION`].
#[must_use]
pub fn foundation_tool() -> (Vec<Tool>, ToolChoice) {
    stage_tooling::<FoundationCheck>(
        CHECK_FOUNDATION,
        "Report whether a concept is foundational (needs no prerequisites to understand)",
    )
}

/// Tool definition for [`LIST_PREREQUISITES`].
#[must_use]
pub fn prerequisites_tool() -> (Vec<Tool>, ToolChoice) {
    stage_tooling::<PrerequisiteList>(
        LIST_PREREQUISITES,
        "List the direct prerequisite concepts needed to understand a concept",
    )
}

/// Tool definition for [`ENRICH_MATH`].
#[must_use]
pub fn math_tool() -> (Vec<Tool>, ToolChoice) {
    stage_tooling::<MathEnrichment>(
        ENRICH_MATH,
        "Provide key equations and formal definitions for a concept",
    )
}

/// Tool definition for [`DESIGN_VISUAL_SPEC`].
#[must_use]
pub fn visual_tool() -> (Vec<Tool>, ToolChoice) {
    stage_tooling::<VisualSpecPayload>(
        DESIGN_VISUAL_SPEC,
        "Design an animated visual treatment for explaining a concept",
    )
}

/// Tool definition for [`COMPOSE_NARRATIVE`].
#[must_use]
pub fn narrative_tool() -> (Vec<Tool>, ToolChoice) {
    stage_tooling::<NarrativePayload>(
        COMPOSE_NARRATIVE,
        "Compose a continuous educational narration covering concepts foundations-first",
    )
}

const BARE_JSON_SUFFIX: &str =
    "Reply with a single bare JSON object and nothing else. No prose, no code fences.";

/// System prompt shared by the exploration stages.
#[must_use]
pub fn explorer_system() -> String {
    "You are an expert educator mapping the prerequisite structure of technical concepts. \
     Be precise and minimal: list only concepts a learner must already understand."
        .to_string()
}

/// User prompt for the foundation check.
#[must_use]
pub fn foundation_prompt(concept: &str, depth: u32, structured: bool) -> String {
    let mut p = format!(
        "Is the following concept foundational, meaning a typical learner can grasp it \
         without first studying other named concepts?\n\nConcept: {concept}\nDepth: {depth}\n"
    );
    if structured {
        p.push_str("Answer by calling the check_foundation tool.");
    } else {
        p.push_str(&format!(
            "Answer as JSON: {{\"is_foundation\": <bool>, \"reasoning\": <string>}}. {BARE_JSON_SUFFIX}"
        ));
    }
    p
}

/// User prompt for prerequisite listing.
#[must_use]
pub fn prerequisites_prompt(concept: &str, depth: u32, structured: bool) -> String {
    let mut p = format!(
        "List the 2-4 most important direct prerequisites for understanding this concept. \
         Name each as a short standalone concept.\n\nConcept: {concept}\nDepth: {depth}\n"
    );
    if structured {
        p.push_str("Answer by calling the list_prerequisites tool.");
    } else {
        p.push_str(&format!(
            "Answer as JSON: {{\"prerequisites\": [<string>, ...]}}. {BARE_JSON_SUFFIX}"
        ));
    }
    p
}

/// System prompt for the enrichment stages.
#[must_use]
pub fn enricher_system() -> String {
    "You are an expert in mathematics education, producing precise supporting material \
     for an animated explainer video."
        .to_string()
}

/// User prompt for mathematical enrichment.
#[must_use]
pub fn math_prompt(concept: &str, structured: bool) -> String {
    let mut p = format!(
        "Give the key equations (LaTeX) and short formal definitions for this concept.\n\n\
         Concept: {concept}\n"
    );
    if structured {
        p.push_str("Answer by calling the enrich_math tool.");
    } else {
        p.push_str(&format!(
            "Answer as JSON: {{\"equations\": [<latex>, ...], \"definitions\": [<string>, ...]}}. \
             {BARE_JSON_SUFFIX}"
        ));
    }
    p
}

/// User prompt for visual design. Threads the parent's visual treatment so
/// child scenes stay stylistically continuous.
#[must_use]
pub fn visual_prompt(concept: &str, parent: Option<&VisualSpec>, structured: bool) -> String {
    let mut p = format!(
        "Design the visual treatment for one scene of an animated explainer.\n\n\
         Concept: {concept}\n"
    );
    if let Some(parent) = parent {
        if let Some(desc) = &parent.visual_description {
            p.push_str(&format!("Previous visual: {desc}\n"));
        }
        if let Some(colors) = &parent.color_scheme {
            p.push_str(&format!("Previous colors: {colors}\n"));
        }
        p.push_str("Keep visual continuity with the previous scene.\n");
    }
    if structured {
        p.push_str("Answer by calling the design_visual_spec tool.");
    } else {
        p.push_str(&format!(
            "Answer as JSON with keys visual_description, color_scheme, animation_description, \
             camera_movement, duration_secs. {BARE_JSON_SUFFIX}"
        ));
    }
    p
}

/// User prompt for narrative composition over the whole tree outline.
#[must_use]
pub fn narrative_prompt(concept: &str, outline: &str, structured: bool) -> String {
    let mut p = format!(
        "Compose a single continuous narration for an explainer video about a concept, \
         teaching its prerequisite concepts foundations-first before the concept itself. \
         Smooth transitions, no section headers.\n\nConcept: {concept}\n\nConcept tree:\n{outline}\n"
    );
    if structured {
        p.push_str("Answer by calling the compose_narrative tool.");
    } else {
        p.push_str(&format!(
            "Answer as JSON with keys narrative, total_duration_secs, scene_count. \
             {BARE_JSON_SUFFIX}"
        ));
    }
    p
}
