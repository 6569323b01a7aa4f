// ============================================================
// Layer 2 — VisualizeUseCase
// ============================================================
// Orchestrates the full visualization pipeline in order:
//
//   Step 1: Clean and validate the input   (Layer 4 - data)
//   Step 2: Resolve preset and palette     (Layers 6 and 7)
//   Step 3: Acquire tokenizer and model    (Layer 6 - infra)
//   Step 4: Extract tokens and attention   (Layer 5 - ml)
//   Step 5: Render and write the heatmap   (Layers 7 and 6)
//   Step 6: Rank and export the top pairs  (Layers 3 and 6)
//
// The model and tokenizer are acquired here, once, and lent to
// the extraction core as handles. Their lifetime is the use
// case's lifetime; there is no process-wide cache.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::preprocessor::Preprocessor;
use crate::domain::attention::AttentionPair;
use crate::domain::ranking::top_pairs;
use crate::domain::token::TokenSequence;
use crate::infra::export::ArtifactWriter;
use crate::infra::model_store::{ModelPreset, ModelStore};
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::extractor::{extract, ModelSession};
use crate::viz::heatmap::render;
use crate::viz::palette::Palette;

// ─── Visualization Configuration ─────────────────────────────────────────────
// The four core inputs (text, layer, head averaging, palette)
// plus the surrounding knobs the CLI exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeConfig {
    pub text:          String,
    pub model:         String,
    pub layer:         Option<usize>,
    pub average_heads: bool,
    pub palette:       String,
    pub top_n:         usize,
    pub out_dir:       String,
    pub model_dir:     String,
}

/// Everything the presentation layer needs to show the result.
#[derive(Debug)]
pub struct VisualizeReport {
    pub tokens:        TokenSequence,
    pub layer:         usize,
    pub average_heads: bool,
    pub pairs:         Vec<AttentionPair>,
    pub heatmap_path:  PathBuf,
    /// None when no valid pairs existed (the "no pairs found"
    /// state; nothing was exported)
    pub scores_path:   Option<PathBuf>,
}

// ─── VisualizeUseCase ─────────────────────────────────────────────────────────
pub struct VisualizeUseCase {
    config: VisualizeConfig,
}

impl VisualizeUseCase {
    pub fn new(config: VisualizeConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline end to end.
    pub fn execute(&self) -> Result<VisualizeReport> {
        let cfg = &self.config;

        // ── Step 1: Clean and validate the input text ─────────────────────────
        // Blank input is rejected here, before any model work
        let text = Preprocessor::new().clean(&cfg.text);
        if text.is_empty() {
            bail!("input text is empty; enter a sentence to visualise");
        }

        // ── Step 2: Resolve the model preset and palette ──────────────────────
        let preset = ModelPreset::resolve(&cfg.model)?;
        let palette = Palette::from_name(&cfg.palette)?;
        let layer = cfg.layer.unwrap_or_else(|| preset.last_layer());
        if layer >= preset.num_layers {
            bail!(
                "layer {} is out of range; '{}' has layers 0..={}",
                layer,
                preset.name,
                preset.last_layer(),
            );
        }

        // ── Step 3: Acquire the tokenizer and model session ───────────────────
        // Both live under one per-model directory so checkpoint
        // and vocabulary always travel together
        let model_dir = PathBuf::from(&cfg.model_dir).join(&preset.name);
        let tokenizer = TokenizerStore::new(&model_dir)
            .load_or_build(&text, preset.vocab_size)?;
        let session = ModelSession::open(&ModelStore::new(&model_dir), &preset)?;

        // ── Step 4: Extract tokens and the attention matrix ───────────────────
        let (tokens, matrix) = extract(&session, &tokenizer, &text, layer, cfg.average_heads)?;
        if matrix.is_empty() {
            bail!("the input produced no tokens; nothing to visualise");
        }
        tracing::info!(
            "Layer {} attention extracted: {} tokens, {}x{} matrix",
            layer,
            tokens.len(),
            matrix.len(),
            matrix.len(),
        );

        // ── Step 5: Render the heatmap and write the PNG ──────────────────────
        let heatmap = render(&tokens, &matrix, palette)?;
        let writer = ArtifactWriter::new(&cfg.out_dir)?;
        let heatmap_path = writer.write_heatmap(&heatmap)?;

        // ── Step 6: Rank the top pairs and export the CSV ─────────────────────
        // An empty ranking is a reportable outcome, not a failure
        let pairs = top_pairs(&tokens, &matrix, cfg.top_n)?;
        let scores_path = if pairs.is_empty() {
            tracing::warn!("No valid token pairs found for attention scoring");
            None
        } else {
            Some(writer.write_scores(&pairs)?)
        };

        Ok(VisualizeReport {
            tokens,
            layer,
            average_heads: cfg.average_heads,
            pairs,
            heatmap_path,
            scores_path,
        })
    }
}
