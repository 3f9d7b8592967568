use std::path::PathBuf;

use clap::Parser;
use kimi_async::{Client, KimiConfig};
use prereq_explorer::{enrich::EnrichmentPipeline, explorer::Explorer, output};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "concept-pipeline",
    version,
    about = "Explore a concept's prerequisite tree and enrich it into an explainer script"
)]
struct Args {
    /// Concept to explore, e.g. "Fourier transform"
    concept: String,

    /// Maximum exploration depth
    #[arg(long, default_value_t = 3)]
    max_depth: u32,

    /// Directory for output artifacts
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Model identifier
    #[arg(long, env = "KIMI_MODEL", default_value = "kimi-k2-0905-preview")]
    model: String,

    /// Disable function tools; recover JSON from plain text instead
    #[arg(long)]
    no_tools: bool,

    /// Explore only; skip enrichment and narrative
    #[arg(long)]
    tree_only: bool,

    /// Load .env from current directory
    #[arg(long = "dot-env")]
    dot_env: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dot_env {
        let _ = dotenvy::dotenv(); // ignore errors
    }

    let default_filter = match args.verbose {
        0 => "concept_pipeline=info,prereq_explorer=info,kimi_async=warn",
        1 => "concept_pipeline=debug,prereq_explorer=debug,kimi_async=info",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    // Fail fast on missing credentials instead of at the first request.
    KimiConfig::new().validate_auth()?;
    let client = || Client::with_config(KimiConfig::new());

    let mut explorer = Explorer::new(client(), &args.model, args.max_depth);
    if args.no_tools {
        explorer = explorer.without_structured_calls();
    }
    let mut tree = explorer.explore(&args.concept).await?;
    let explore_stats = explorer.stats();

    println!("\nPrerequisite tree:\n{}", tree.render_outline());

    let run = if args.tree_only {
        None
    } else {
        let mut pipeline = EnrichmentPipeline::new(client(), &args.model);
        if args.no_tools {
            pipeline = pipeline.without_structured_calls();
        }
        Some(pipeline.run(&mut tree).await?)
    };

    let narrative_text = run
        .as_ref()
        .and_then(|r| r.narrative.as_ref())
        .map(|n| n.text.clone());
    let paths = output::write_artifacts(&args.output_dir, &tree, narrative_text.as_deref())?;

    println!("Explored {} nodes ({} deepest level)", explore_stats.nodes, tree.deepest());
    println!(
        "Service calls: {} ({} memo hits, {} degraded nodes)",
        explore_stats.service_calls, explore_stats.memo_hits, explore_stats.degraded
    );
    if let Some(run) = &run {
        println!(
            "Enrichment failures: {} math, {} visual, {} narrative",
            run.stats.math_failures, run.stats.visual_failures, run.stats.narrative_failures
        );
        if let Some(n) = &run.narrative {
            println!(
                "Narrative: {} scenes, {:.0}s total",
                n.scene_count, n.total_duration_secs
            );
        }
    }
    println!("Wrote {}", paths.tree.display());
    if let Some(narrative) = &paths.narrative {
        println!("Wrote {}", narrative.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_and_flags_parse() {
        // SAFETY: no other test in this binary reads the environment
        unsafe {
            std::env::remove_var("KIMI_MODEL");
        }

        let args = Args::parse_from(["concept-pipeline", "Fourier transform"]);
        assert_eq!(args.concept, "Fourier transform");
        assert_eq!(args.max_depth, 3);
        assert_eq!(args.model, "kimi-k2-0905-preview");
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert!(!args.no_tools);
        assert!(!args.tree_only);

        let args = Args::parse_from([
            "concept-pipeline",
            "calculus",
            "--max-depth",
            "2",
            "--model",
            "kimi-k2-turbo-preview",
            "--no-tools",
            "--tree-only",
            "-vv",
        ]);
        assert_eq!(args.max_depth, 2);
        assert_eq!(args.model, "kimi-k2-turbo-preview");
        assert!(args.no_tools && args.tree_only);
        assert_eq!(args.verbose, 2);
    }
}
