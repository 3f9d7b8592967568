use kimi_async::{Client, KimiConfig};
use prereq_explorer::enrich::{EnrichmentPipeline, MathEnricher, NarrativeComposer, VisualDesigner};
use prereq_explorer::tree::{ConceptNode, StageKind};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client<KimiConfig> {
    let cfg = KimiConfig::new()
        .with_api_key("test-key")
        .with_api_base(server.uri());
    Client::with_config(cfg)
}

fn tool_response(tool: &str, args: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "model": "kimi-k2-0905-preview",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": tool, "arguments": args.to_string() }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    }))
}

/// calculus -> [limits, functions], both foundational.
fn sample_tree() -> ConceptNode {
    let mut root = ConceptNode::new("calculus", 0);
    root.prerequisites.push(ConceptNode::foundation("limits", 1));
    root.prerequisites
        .push(ConceptNode::foundation("functions", 1));
    root
}

async fn mount_math(server: &MockServer, concept: &str, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"name\":\"enrich_math\""))
        .and(body_string_contains(format!("Concept: {concept}\\n")))
        .respond_with(tool_response(
            "enrich_math",
            json!({
                "equations": [format!("{concept}: f(x)")],
                "definitions": [format!("definition of {concept}")]
            }),
        ))
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_visual(server: &MockServer, concept: &str, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"name\":\"design_visual_spec\""))
        .and(body_string_contains(format!("Concept: {concept}\\n")))
        .respond_with(tool_response(
            "design_visual_spec",
            json!({
                "visual_description": format!("scene for {concept}"),
                "color_scheme": "blue and gold",
                "animation_description": "smooth morph",
                "duration_secs": 20.0
            }),
        ))
        .expect(expect)
        .mount(server)
        .await;
}

#[tokio::test]
async fn math_stage_touches_only_math_fields() {
    let server = MockServer::start().await;
    mount_math(&server, "calculus", 1).await;
    mount_math(&server, "limits", 1).await;
    mount_math(&server, "functions", 1).await;

    let client = client_for(&server);
    let mut tree = sample_tree();
    let mut enricher = MathEnricher::new(&client, "kimi-k2-0905-preview", true);
    let failures = enricher.enrich(&mut tree).await.unwrap();

    assert_eq!(failures, 0);
    assert_eq!(tree.equations.as_deref(), Some(&["calculus: f(x)".to_string()][..]));
    assert_eq!(
        tree.prerequisites[0].definitions.as_deref(),
        Some(&["definition of limits".to_string()][..])
    );
    // Other stages' fields stay untouched.
    assert!(tree.visual_spec.is_none());
    assert!(tree.narrative.is_none());
}

#[tokio::test]
async fn visual_stage_threads_parent_design_into_child_prompts() {
    let server = MockServer::start().await;
    mount_visual(&server, "calculus", 1).await;
    mount_visual(&server, "limits", 1).await;
    mount_visual(&server, "functions", 1).await;

    let client = client_for(&server);
    let mut tree = sample_tree();
    let mut designer = VisualDesigner::new(&client, "kimi-k2-0905-preview", true);
    let failures = designer.design(&mut tree).await.unwrap();

    assert_eq!(failures, 0);
    assert_eq!(
        tree.visual_spec.as_ref().unwrap().visual_description.as_deref(),
        Some("scene for calculus")
    );
    assert!(tree.prerequisites[0].visual_spec.is_some());
    assert!(tree.equations.is_none());

    // Child requests reference the parent's finished design.
    let requests = server.received_requests().await.unwrap();
    let child_request = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .find(|b| b.contains("Concept: limits\\n"))
        .unwrap();
    assert!(child_request.contains("Previous visual: scene for calculus"));
    assert!(child_request.contains("Previous colors: blue and gold"));
}

#[tokio::test]
async fn repeated_concept_enriched_once_per_stage() {
    let server = MockServer::start().await;
    // "limits" appears twice in the tree but may only be requested once.
    mount_math(&server, "calculus", 1).await;
    mount_math(&server, "limits", 1).await;

    let client = client_for(&server);
    let mut tree = ConceptNode::new("calculus", 0);
    tree.prerequisites.push(ConceptNode::foundation("limits", 1));
    tree.prerequisites.push(ConceptNode::foundation("limits", 1));

    let mut enricher = MathEnricher::new(&client, "kimi-k2-0905-preview", true);
    let failures = enricher.enrich(&mut tree).await.unwrap();

    assert_eq!(failures, 0);
    assert_eq!(
        tree.prerequisites[0].equations,
        tree.prerequisites[1].equations
    );
}

#[tokio::test]
async fn failed_math_call_leaves_fields_none_and_records_error() {
    let server = MockServer::start().await;
    mount_math(&server, "calculus", 1).await;
    // "limits" gets garbage text instead of a payload.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Concept: limits\\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cmpl-bad",
            "object": "chat.completion",
            "model": "kimi-k2-0905-preview",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "no math today" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_math(&server, "functions", 1).await;

    let client = client_for(&server);
    let mut tree = sample_tree();
    let mut enricher = MathEnricher::new(&client, "kimi-k2-0905-preview", true);
    let failures = enricher.enrich(&mut tree).await.unwrap();

    assert_eq!(failures, 1);
    let limits = &tree.prerequisites[0];
    assert!(limits.equations.is_none());
    assert!(limits.definitions.is_none());
    assert_eq!(limits.enrichment_errors.len(), 1);
    assert_eq!(limits.enrichment_errors[0].stage, StageKind::Math);
    // Siblings and the root were still enriched.
    assert!(tree.equations.is_some());
    assert!(tree.prerequisites[1].equations.is_some());
}

#[tokio::test]
async fn narrative_composed_from_outline_and_stored_on_root() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"name\":\"compose_narrative\""))
        .respond_with(tool_response(
            "compose_narrative",
            json!({
                "narrative": "We begin with limits and functions, then calculus.",
                "total_duration_secs": 120.0,
                "scene_count": 3
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut tree = sample_tree();
    let composer = NarrativeComposer::new(&client, "kimi-k2-0905-preview", true);
    let narrative = composer.compose(&mut tree).await.unwrap().unwrap();

    assert_eq!(narrative.scene_count, 3);
    assert!((narrative.total_duration_secs - 120.0).abs() < f64::EPSILON);
    assert_eq!(narrative.concept_order, vec!["limits", "functions", "calculus"]);
    assert_eq!(
        tree.narrative.as_deref(),
        Some("We begin with limits and functions, then calculus.")
    );

    // The request carried the tree outline.
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.contains("- calculus\\n"));
    assert!(body.contains("  - limits [foundation]\\n"));
}

#[tokio::test]
async fn narrative_defaults_derived_when_model_omits_scalars() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(tool_response(
            "compose_narrative",
            json!({ "narrative": "A short story." }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut tree = sample_tree();
    tree.visual_spec = Some(prereq_explorer::tree::VisualSpec {
        duration_secs: Some(30.0),
        ..Default::default()
    });
    tree.prerequisites[0].visual_spec = Some(prereq_explorer::tree::VisualSpec {
        duration_secs: Some(15.0),
        ..Default::default()
    });

    let composer = NarrativeComposer::new(&client, "kimi-k2-0905-preview", true);
    let narrative = composer.compose(&mut tree).await.unwrap().unwrap();

    // Three unique concepts; durations summed from the visual specs.
    assert_eq!(narrative.scene_count, 3);
    assert!((narrative.total_duration_secs - 45.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn full_pipeline_runs_stages_in_order() {
    let server = MockServer::start().await;
    for concept in ["calculus", "limits", "functions"] {
        mount_math(&server, concept, 1).await;
        mount_visual(&server, concept, 1).await;
    }
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("\"name\":\"compose_narrative\""))
        .respond_with(tool_response(
            "compose_narrative",
            json!({ "narrative": "The whole story.", "total_duration_secs": 60.0, "scene_count": 3 }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut tree = sample_tree();
    let pipeline = EnrichmentPipeline::new(client_for(&server), "kimi-k2-0905-preview");
    let run = pipeline.run(&mut tree).await.unwrap();

    assert_eq!(run.stats.math_failures, 0);
    assert_eq!(run.stats.visual_failures, 0);
    assert_eq!(run.stats.narrative_failures, 0);
    assert_eq!(run.narrative.unwrap().text, "The whole story.");
    assert!(tree.equations.is_some());
    assert!(tree.visual_spec.is_some());
    assert_eq!(tree.narrative.as_deref(), Some("The whole story."));
}
