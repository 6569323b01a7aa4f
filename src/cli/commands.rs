// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `visualize` and `models`,
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, bool, etc.)

use clap::{ArgAction, Args, Subcommand};
use crate::application::visualize_use_case::VisualizeConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render an attention heatmap and rank the top token pairs
    Visualize(VisualizeArgs),

    /// List the available model presets and their depths
    Models,
}

/// All arguments for the `visualize` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct VisualizeArgs {
    /// The sentence to analyse
    #[arg(long)]
    pub text: String,

    /// Model preset to run (bert-base-uncased or distilgpt2)
    #[arg(long, default_value = "bert-base-uncased")]
    pub model: String,

    /// Attention layer to inspect, 0-based and bounded by the
    /// model's depth. Defaults to the model's last layer
    #[arg(long)]
    pub layer: Option<usize>,

    /// Average all attention heads; pass `--average-heads false`
    /// to see head 0 instead
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub average_heads: bool,

    /// Heatmap colour palette
    /// (coolwarm, viridis, ylgnbu, magma, cubehelix)
    #[arg(long, default_value = "coolwarm")]
    pub palette: String,

    /// Number of top attention pairs to report and export
    #[arg(long, default_value_t = 5)]
    pub top_n: usize,

    /// Directory for the PNG and CSV artifacts
    #[arg(long, default_value = "out")]
    pub out_dir: String,

    /// Directory holding model checkpoints and tokenizers
    #[arg(long, default_value = "models")]
    pub model_dir: String,
}

/// Convert CLI VisualizeArgs into the application-layer config.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<VisualizeArgs> for VisualizeConfig {
    fn from(a: VisualizeArgs) -> Self {
        VisualizeConfig {
            text:          a.text,
            model:         a.model,
            layer:         a.layer,
            average_heads: a.average_heads,
            palette:       a.palette,
            top_n:         a.top_n,
            out_dir:       a.out_dir,
            model_dir:     a.model_dir,
        }
    }
}
