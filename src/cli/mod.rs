// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `visualize` — extracts attention, writes the heatmap
//      PNG and the top-pair CSV, prints the tables
//   2. `models`    — lists the available model presets

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, VisualizeArgs};

use crate::application::visualize_use_case::VisualizeReport;
use crate::infra::model_store::ModelPreset;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "attention-explorer",
    version = "0.1.0",
    about = "Visualize transformer self-attention: heatmaps and top token-to-token dependencies."
)]
pub struct Cli {
    /// The subcommand to run (visualize or models)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Visualize(args) => Self::run_visualize(args),
            Commands::Models          => Self::run_models(),
        }
    }

    /// Handles the `visualize` subcommand.
    /// Converts CLI args into a VisualizeConfig and hands off to Layer 2.
    fn run_visualize(args: VisualizeArgs) -> Result<()> {
        use crate::application::visualize_use_case::VisualizeUseCase;

        tracing::info!("Visualizing attention for model '{}'", args.model);

        // Convert CLI args → application config (separates presentation from domain)
        let use_case = VisualizeUseCase::new(args.into());
        let report = use_case.execute()?;

        print_report(&report);
        Ok(())
    }

    /// Handles the `models` subcommand: lists each preset with
    /// its valid layer range.
    fn run_models() -> Result<()> {
        println!("Available models:");
        for preset in ModelPreset::all() {
            println!(
                "  {:<20} layers 0..={}  heads {}  d_model {}  max tokens {}",
                preset.name,
                preset.last_layer(),
                preset.num_heads,
                preset.d_model,
                preset.max_seq_len,
            );
        }
        Ok(())
    }
}

/// Print the token table, the top-pair table, and artifact paths.
fn print_report(report: &VisualizeReport) {
    let head_mode = if report.average_heads { "averaged heads" } else { "head 0" };
    println!("\nAttention layer {} ({})", report.layer, head_mode);

    println!("\n{:>5}  Token", "Index");
    for (index, token) in report.tokens.iter().enumerate() {
        println!("{:>5}  {}", index, token);
    }

    if report.pairs.is_empty() {
        println!("\nNo valid token pairs found for attention scoring.");
    } else {
        println!("\nTop attention dependencies (excluding special tokens, punctuation and self-loops):");
        println!("{:<32} Score", "Source → Target");
        for pair in &report.pairs {
            println!("{:<32} {:.2}", pair.arrow_label(), pair.score);
        }
    }

    println!("\nHeatmap written to {}", report.heatmap_path.display());
    if let Some(path) = &report.scores_path {
        println!("Scores written to {}", path.display());
    }
}
