// ============================================================
// Layer 6 — Model Store
// ============================================================
// Owns everything about acquiring a model: the preset registry
// for the two supported identifiers, and checkpoint storage.
//
// What lives in a model directory:
//   1. model.mpk.gz       — encoder weights (CompactRecorder)
//   2. model_config.json  — the preset the weights were built for
//
// Why save the preset next to the weights?
//   Loading weights requires rebuilding the exact architecture
//   first. The JSON makes a checkpoint directory self-describing
//   and lets the store reject a preset/checkpoint mismatch with
//   a clear error instead of a recorder type failure.
//
// There is no hidden global model cache: the application asks
// the store once, gets a handle, and owns its lifetime.

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::ml::model::{EncoderConfig, EncoderModel};

/// Identifier of the BERT-style preset.
pub const BERT_BASE_UNCASED: &str = "bert-base-uncased";
/// Identifier of the distilled GPT-2-style preset.
pub const DISTILGPT2: &str = "distilgpt2";

// ─── Model Presets ────────────────────────────────────────────────────────────
/// Architecture numbers for one named model. The two presets
/// mirror the published architectures of the identifiers they
/// are named after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPreset {
    pub name:        String,
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
}

impl ModelPreset {
    /// Resolve a preset by its model identifier.
    pub fn resolve(name: &str) -> Result<Self> {
        match name {
            BERT_BASE_UNCASED => Ok(Self {
                name:        BERT_BASE_UNCASED.to_string(),
                vocab_size:  30522,
                max_seq_len: 512,
                d_model:     768,
                num_heads:   12,
                num_layers:  12,
                d_ff:        3072,
            }),
            DISTILGPT2 => Ok(Self {
                name:        DISTILGPT2.to_string(),
                vocab_size:  50257,
                max_seq_len: 1024,
                d_model:     768,
                num_heads:   12,
                num_layers:  6,
                d_ff:        3072,
            }),
            other => bail!(
                "unknown model '{}'; available models: {}, {}",
                other,
                BERT_BASE_UNCASED,
                DISTILGPT2,
            ),
        }
    }

    /// Every preset this build knows about.
    pub fn all() -> Vec<Self> {
        [BERT_BASE_UNCASED, DISTILGPT2]
            .iter()
            .filter_map(|name| Self::resolve(name).ok())
            .collect()
    }

    /// Highest valid attention layer index.
    pub fn last_layer(&self) -> usize {
        self.num_layers - 1
    }

    /// The Burn config for this architecture. Dropout is 0 because
    /// the store only builds models for inference.
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig::new(
            self.vocab_size, self.max_seq_len, self.d_model,
            self.num_heads, self.num_layers, self.d_ff, 0.0,
        )
    }
}

// ─── ModelStore ───────────────────────────────────────────────────────────────
/// Checkpoint storage for one model directory.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Create a store over a directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        // Like `mkdir -p`; an already existing directory is fine
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Load the preset's weights from this directory, or
    /// initialise fresh weights and save them so every later run
    /// sees the same parameters (and therefore the same attention
    /// maps).
    pub fn load_or_init<B: Backend>(
        &self,
        preset: &ModelPreset,
        device: &B::Device,
    ) -> Result<EncoderModel<B>> {
        if let Some(saved) = self.load_preset()? {
            if saved != *preset {
                bail!(
                    "checkpoint in '{}' was created for model '{}', not '{}'",
                    self.dir.display(),
                    saved.name,
                    preset.name,
                );
            }
        }

        let model = preset.encoder_config().init::<B>(device);

        if self.has_checkpoint() {
            tracing::info!(
                "Loading '{}' weights from '{}'",
                preset.name,
                self.dir.display()
            );
            let path = self.weights_path();
            let record = CompactRecorder::new()
                .load(path.clone(), device)
                .with_context(|| {
                    format!("Cannot load checkpoint '{}'", path.display())
                })?;
            Ok(model.load_record(record))
        } else {
            tracing::warn!(
                "No checkpoint for '{}' in '{}'; initialising fresh weights \
                 (attention maps will come from untrained parameters)",
                preset.name,
                self.dir.display(),
            );
            self.save_model(&model)?;
            self.save_preset(preset)?;
            Ok(model)
        }
    }

    /// Save encoder weights with CompactRecorder
    /// (MessagePack + gzip, type-safe on reload).
    pub fn save_model<B: Backend>(&self, model: &EncoderModel<B>) -> Result<()> {
        let path = self.weights_path();
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;
        tracing::debug!("Saved model weights to '{}'", path.display());
        Ok(())
    }

    /// Save the preset JSON next to the weights.
    pub fn save_preset(&self, preset: &ModelPreset) -> Result<()> {
        let path = self.config_path();
        let json = serde_json::to_string_pretty(preset)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    /// Load the saved preset JSON, if this directory has one.
    pub fn load_preset(&self) -> Result<Option<ModelPreset>> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn has_checkpoint(&self) -> bool {
        // CompactRecorder (NamedMpkFileRecorder) appends the .mpk extension itself
        self.dir.join("model.mpk").exists()
    }

    fn weights_path(&self) -> PathBuf {
        // Extension is added by the recorder
        self.dir.join("model")
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join("model_config.json")
    }
}
