// ============================================================
// Layer 5 — Extraction Engine
// ============================================================
// The core pipeline: tokenise → one forward pass → select a
// layer → reduce the head dimension → recover token strings.
//
// ModelSession owns the loaded encoder and implements the
// domain's AttentionSource trait, converting Burn tensors into
// plain-float domain tensors at the boundary. extract() is the
// pipeline itself and only sees the trait, so it is testable
// against hand-built attention maps.

use anyhow::{anyhow, bail, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::domain::attention::{AttentionMatrix, AttentionTensor};
use crate::domain::token::TokenSequence;
use crate::domain::traits::AttentionSource;
use crate::infra::model_store::{ModelPreset, ModelStore};
use crate::ml::model::EncoderModel;

/// Backend used for inference. A plain backend (no autodiff
/// wrapper), so forward passes never accumulate gradient state.
pub type InferBackend = burn::backend::Wgpu;

// BERT-convention special token ids, matching the tokenizer store
pub const CLS_ID: u32 = 101;
pub const SEP_ID: u32 = 102;

const UNK_TOKEN: &str = "[UNK]";

/// A loaded model ready to answer attention queries.
///
/// Acquired once by the host, then lent to extract() as a
/// read-only AttentionSource handle.
pub struct ModelSession<B: Backend> {
    model:       EncoderModel<B>,
    max_seq_len: usize,
    device:      B::Device,
}

impl ModelSession<InferBackend> {
    /// Load (or initialise) the preset's weights from the store
    /// and wrap them in a session on the default device.
    pub fn open(store: &ModelStore, preset: &ModelPreset) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let model = store.load_or_init::<InferBackend>(preset, &device)?;
        tracing::info!("Model '{}' ready ({} layers)", preset.name, model.num_layers());
        Ok(Self::new(model, device))
    }
}

impl<B: Backend> ModelSession<B> {
    pub fn new(model: EncoderModel<B>, device: B::Device) -> Self {
        let max_seq_len = model.max_seq_len();
        Self { model, max_seq_len, device }
    }
}

impl<B: Backend> AttentionSource for ModelSession<B> {
    fn layer_count(&self) -> usize {
        self.model.num_layers()
    }

    fn attention_maps(&self, input_ids: &[u32]) -> Result<Vec<AttentionTensor>> {
        if input_ids.is_empty() {
            bail!("cannot run inference on an empty input sequence");
        }
        // Fail fast instead of silently truncating the input
        if input_ids.len() > self.max_seq_len {
            bail!(
                "input of {} tokens exceeds the model's maximum sequence length {}",
                input_ids.len(),
                self.max_seq_len,
            );
        }

        let input_flat: Vec<i32> = input_ids.iter().map(|&x| x as i32).collect();
        let input_tensor = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device,
        ).unsqueeze::<2>();

        let (_, attentions) = self.model.forward_with_attentions(input_tensor);

        attentions
            .into_iter()
            .map(|weights| {
                let [_, heads, n, _] = weights.dims();
                let data = weights
                    .into_data()
                    .to_vec::<f32>()
                    .map_err(|e| anyhow!("attention tensor readback failed: {e:?}"))?;
                AttentionTensor::new(heads, n, data)
            })
            .collect()
    }
}

/// Extract the token sequence and one N x N attention matrix for
/// `text` at the given layer.
///
/// The input is framed as [CLS] text [SEP] before inference.
/// With `average_heads` the matrix is the element-wise mean over
/// all heads; otherwise it is head 0, deterministically (no head
/// selector is exposed).
///
/// Text that tokenises to zero tokens yields an empty sequence
/// and empty matrix: "no visualization possible", not an error.
pub fn extract(
    source: &dyn AttentionSource,
    tokenizer: &Tokenizer,
    text: &str,
    layer: usize,
    average_heads: bool,
) -> Result<(TokenSequence, AttentionMatrix)> {
    let layer_count = source.layer_count();
    if layer >= layer_count {
        bail!("layer {} is out of range for a {}-layer model", layer, layer_count);
    }

    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
    if encoding.get_ids().is_empty() {
        tracing::warn!("Input tokenised to zero tokens; nothing to visualise");
        return Ok((TokenSequence::new(Vec::new()), AttentionMatrix::empty()));
    }

    // Build [CLS] text [SEP]
    let mut input_ids: Vec<u32> = vec![CLS_ID];
    input_ids.extend_from_slice(encoding.get_ids());
    input_ids.push(SEP_ID);

    let maps = source.attention_maps(&input_ids)?;
    let tensor = maps.get(layer).ok_or_else(|| {
        anyhow!("model returned {} attention maps, expected {}", maps.len(), layer_count)
    })?;

    let matrix = if average_heads {
        tensor.mean_heads()
    } else {
        tensor.head(0)?
    };

    // Convert ids back to the human-readable token strings
    let tokens: Vec<String> = input_ids
        .iter()
        .map(|&id| tokenizer.id_to_token(id).unwrap_or_else(|| UNK_TOKEN.to_string()))
        .collect();
    let tokens = TokenSequence::new(tokens);

    // Invariant: token count equals both matrix dimensions.
    // A mismatch means the model and tokenizer disagree; fail
    // fast rather than truncate or pad.
    if tokens.len() != matrix.len() {
        bail!(
            "token count {} does not match attention matrix dimension {}",
            tokens.len(),
            matrix.len(),
        );
    }

    tracing::debug!(
        "Extracted {}x{} attention at layer {} ({})",
        matrix.len(),
        matrix.len(),
        layer,
        if average_heads { "averaged heads" } else { "head 0" },
    );

    Ok((tokens, matrix))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::top_pairs;
    use crate::infra::tokenizer_store::TokenizerStore;
    use crate::ml::model::EncoderConfig;

    type TestBackend = burn::backend::NdArray;

    fn device() -> <TestBackend as Backend>::Device {
        Default::default()
    }

    fn test_tokenizer(text: &str) -> Tokenizer {
        let dir = tempfile::tempdir().unwrap();
        TokenizerStore::new(dir.path())
            .load_or_build(text, 1024)
            .unwrap()
    }

    fn test_session(max_seq_len: usize, num_layers: usize) -> ModelSession<TestBackend> {
        let device = device();
        let config = EncoderConfig::new(256, max_seq_len, 8, 2, num_layers, 16, 0.0);
        ModelSession::new(config.init::<TestBackend>(&device), device)
    }

    // A stub source with two layers of known values, so layer and
    // head selection are checked against exact numbers.
    struct StubSource {
        maps: Vec<AttentionTensor>,
    }

    impl AttentionSource for StubSource {
        fn layer_count(&self) -> usize {
            self.maps.len()
        }

        fn attention_maps(&self, _input_ids: &[u32]) -> Result<Vec<AttentionTensor>> {
            Ok(self.maps.clone())
        }
    }

    fn stub_for(n: usize) -> StubSource {
        // layer 0: head0 all 0.25, head1 all 0.75
        // layer 1: both heads all 0.5
        let layer0 = {
            let mut data = vec![0.25f32; n * n];
            data.extend(vec![0.75f32; n * n]);
            AttentionTensor::new(2, n, data).unwrap()
        };
        let layer1 = AttentionTensor::new(2, n, vec![0.5f32; 2 * n * n]).unwrap();
        StubSource { maps: vec![layer0, layer1] }
    }

    #[test]
    fn test_head_zero_vs_mean_selection() {
        let text = "the dog ran";
        let tokenizer = test_tokenizer(text);
        // [CLS] the dog ran [SEP]
        let source = stub_for(5);

        let (tokens, head0) = extract(&source, &tokenizer, text, 0, false).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(head0.get(1, 2), 0.25);

        let (_, mean) = extract(&source, &tokenizer, text, 0, true).unwrap();
        assert!((mean.get(1, 2) - 0.5).abs() < 1e-6);

        // Layer selection picks the right tensor
        let (_, layer1) = extract(&source, &tokenizer, text, 1, false).unwrap();
        assert_eq!(layer1.get(0, 0), 0.5);
    }

    #[test]
    fn test_layer_out_of_range_errors() {
        let text = "the dog ran";
        let tokenizer = test_tokenizer(text);
        let source = stub_for(5);
        assert!(extract(&source, &tokenizer, text, 2, true).is_err());
    }

    #[test]
    fn test_tokens_are_framed_with_boundary_markers() {
        let text = "the dog ran";
        let tokenizer = test_tokenizer(text);
        let source = stub_for(5);
        let (tokens, _) = extract(&source, &tokenizer, text, 0, true).unwrap();
        assert_eq!(tokens.get(0), Some("[CLS]"));
        assert_eq!(tokens.get(1), Some("the"));
        assert_eq!(tokens.get(4), Some("[SEP]"));
    }

    #[test]
    fn test_real_model_end_to_end() {
        // Full pipeline: "Obama was born.", last layer, averaged
        // heads
        let text = "Obama was born.";
        let tokenizer = test_tokenizer(text);
        let session = test_session(16, 2);

        let (tokens, matrix) = extract(&session, &tokenizer, text, 1, true).unwrap();

        // [CLS] obama was born . [SEP]
        assert_eq!(tokens.len(), 6);
        assert_eq!(matrix.len(), 6);
        assert_eq!(tokens.get(0), Some("[CLS]"));
        assert_eq!(tokens.get(1), Some("obama"));
        assert_eq!(tokens.get(4), Some("."));
        assert_eq!(tokens.get(5), Some("[SEP]"));

        // Averaging softmax rows keeps every row stochastic
        for i in 0..matrix.len() {
            assert!((matrix.row_sum(i) - 1.0).abs() < 1e-3, "row {} sums to {}", i, matrix.row_sum(i));
        }

        // Ranking sees only {obama, was, born}: 6 ordered pairs,
        // capped at top 5
        let pairs = top_pairs(&tokens, &matrix, 5).unwrap();
        assert_eq!(pairs.len(), 5);
        for pair in &pairs {
            assert!((1..=3).contains(&pair.source_index));
            assert!((1..=3).contains(&pair.target_index));
        }
    }

    #[test]
    fn test_session_rejects_inputs_past_max_seq_len() {
        let text = "one two three four five six seven";
        let tokenizer = test_tokenizer(text);
        // Frame adds [CLS]/[SEP]: 7 words + 2 > 8
        let session = test_session(8, 2);
        assert!(extract(&session, &tokenizer, text, 0, true).is_err());
    }

    #[test]
    fn test_session_rejects_empty_input() {
        let session = test_session(8, 2);
        assert!(session.attention_maps(&[]).is_err());
    }

    #[test]
    fn test_zero_token_text_yields_empty_result() {
        let tokenizer = test_tokenizer("the dog ran");
        let source = stub_for(5);
        let (tokens, matrix) = extract(&source, &tokenizer, "", 0, true).unwrap();
        assert!(tokens.is_empty());
        assert!(matrix.is_empty());
    }
}
