// ============================================================
// Layer 3 — Attention Domain Types
// ============================================================
// Plain-float views of one layer's attention, after the batch
// dimension (always 1 here) has been collapsed:
//
//   AttentionTensor  — all heads of one layer: H x N x N
//   AttentionMatrix  — one N x N view (a head slice, or the
//                      element-wise mean over heads)
//   AttentionPair    — a ranked (source, target, score) triple
//
// Every row of a well-formed tensor or matrix is a probability
// distribution over key positions (sums to ~1). The ml layer
// converts framework tensors into these types; everything past
// that point is pure Rust.
//
// Reference: Vaswani et al. (2017) Attention Is All You Need

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

/// One layer's attention weights for every head: H x N x N,
/// row-major, non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionTensor {
    heads: usize,
    len: usize,
    data: Vec<f32>,
}

impl AttentionTensor {
    /// Build a tensor from a flat buffer. The buffer length must be
    /// exactly heads * len * len.
    pub fn new(heads: usize, len: usize, data: Vec<f32>) -> Result<Self> {
        let expected = heads * len * len;
        if data.len() != expected {
            bail!(
                "attention tensor buffer holds {} values, expected {} ({} heads x {}x{})",
                data.len(),
                expected,
                heads,
                len,
                len,
            );
        }
        Ok(Self { heads, len, data })
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    /// Sequence length N (both matrix dimensions).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Weight at (head, query i, key j). Indices must be in range.
    pub fn get(&self, head: usize, i: usize, j: usize) -> f32 {
        self.data[(head * self.len + i) * self.len + j]
    }

    /// Element-wise arithmetic mean across the head dimension.
    pub fn mean_heads(&self) -> AttentionMatrix {
        let n = self.len;
        if self.heads == 0 || n == 0 {
            return AttentionMatrix::empty();
        }
        let mut data = vec![0.0f32; n * n];
        for head in 0..self.heads {
            let offset = head * n * n;
            for (cell, value) in data.iter_mut().zip(&self.data[offset..offset + n * n]) {
                *cell += value;
            }
        }
        let scale = 1.0 / self.heads as f32;
        for cell in &mut data {
            *cell *= scale;
        }
        AttentionMatrix { len: n, data }
    }

    /// One head's N x N slice.
    pub fn head(&self, head: usize) -> Result<AttentionMatrix> {
        if head >= self.heads {
            bail!("head {} is out of range for a {}-head tensor", head, self.heads);
        }
        let n = self.len;
        let offset = head * n * n;
        Ok(AttentionMatrix {
            len: n,
            data: self.data[offset..offset + n * n].to_vec(),
        })
    }
}

/// An N x N attention matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionMatrix {
    len: usize,
    data: Vec<f32>,
}

impl AttentionMatrix {
    pub fn new(len: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != len * len {
            bail!(
                "attention matrix buffer holds {} values, expected {} for a {}x{} matrix",
                data.len(),
                len * len,
                len,
                len,
            );
        }
        Ok(Self { len, data })
    }

    /// The zero-token matrix, the "no visualization possible" value.
    pub fn empty() -> Self {
        Self { len: 0, data: Vec::new() }
    }

    /// Row/column count N.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Weight at (query i, key j). Indices must be in range.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.len + j]
    }

    /// Sum of row i, ~1 for a well-formed matrix.
    pub fn row_sum(&self, i: usize) -> f32 {
        self.data[i * self.len..(i + 1) * self.len].iter().sum()
    }

    /// (min, max) over all cells, used to normalise colours when
    /// rendering. Errors on an empty matrix.
    pub fn value_range(&self) -> Result<(f32, f32)> {
        let mut values = self.data.iter();
        let first = *values
            .next()
            .ok_or_else(|| anyhow!("an empty attention matrix has no value range"))?;
        let mut min = first;
        let mut max = first;
        for &value in values {
            min = min.min(value);
            max = max.max(value);
        }
        Ok((min, max))
    }
}

/// One ranked attention dependency between two tokens.
///
/// `source` and `target` are index-disambiguated labels
/// ("obama_1"), so repeated tokens stay distinguishable in
/// tables and CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionPair {
    pub source: String,
    pub target: String,
    pub source_index: usize,
    pub target_index: usize,
    pub score: f32,
}

impl AttentionPair {
    /// The "source → target" form used by tables and CSV rows.
    pub fn arrow_label(&self) -> String {
        format!("{} → {}", self.source, self.target)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    // A 2-head, 3-token tensor with known values:
    //   head 0: identity-like (strong diagonal)
    //   head 1: uniform 0.5
    fn synthetic_tensor() -> AttentionTensor {
        #[rustfmt::skip]
        let head0 = vec![
            0.8, 0.1, 0.1,
            0.1, 0.8, 0.1,
            0.1, 0.1, 0.8,
        ];
        let head1 = vec![0.5f32; 9];
        let mut data = head0;
        data.extend(head1);
        AttentionTensor::new(2, 3, data).unwrap()
    }

    #[test]
    fn test_head_zero_reproduced_exactly() {
        let tensor = synthetic_tensor();
        assert_eq!(tensor.heads(), 2);
        assert_eq!(tensor.len(), 3);
        assert_eq!(tensor.get(1, 0, 0), 0.5);

        let head0 = tensor.head(0).unwrap();
        assert_eq!(head0.len(), 3);
        assert_eq!(head0.get(0, 0), 0.8);
        assert_eq!(head0.get(0, 1), 0.1);
        assert_eq!(head0.get(2, 2), 0.8);
    }

    #[test]
    fn test_mean_heads_is_elementwise_average() {
        let tensor = synthetic_tensor();
        let mean = tensor.mean_heads();
        // (head0 + head1) / 2, elementwise
        assert!((mean.get(0, 0) - 0.65).abs() < 1e-6);
        assert!((mean.get(0, 1) - 0.30).abs() < 1e-6);
        assert!((mean.get(1, 1) - 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_head_out_of_range_errors() {
        let tensor = synthetic_tensor();
        assert!(tensor.head(2).is_err());
    }

    #[test]
    fn test_tensor_rejects_wrong_buffer_size() {
        assert!(AttentionTensor::new(2, 3, vec![0.0; 17]).is_err());
    }

    #[test]
    fn test_matrix_rejects_non_square_buffer() {
        assert!(AttentionMatrix::new(3, vec![0.0; 8]).is_err());
    }

    #[test]
    fn test_row_sum_and_value_range() {
        let matrix = AttentionMatrix::new(2, vec![0.9, 0.1, 0.4, 0.6]).unwrap();
        assert!((matrix.row_sum(0) - 1.0).abs() < 1e-6);
        assert!((matrix.row_sum(1) - 1.0).abs() < 1e-6);
        let (min, max) = matrix.value_range().unwrap();
        assert_eq!(min, 0.1);
        assert_eq!(max, 0.9);
    }

    #[test]
    fn test_empty_matrix_has_no_range() {
        assert!(AttentionMatrix::empty().value_range().is_err());
        assert!(AttentionMatrix::empty().is_empty());
    }

    #[test]
    fn test_arrow_label() {
        let pair = AttentionPair {
            source: "obama_1".to_string(),
            target: "born_3".to_string(),
            source_index: 1,
            target_index: 3,
            score: 0.42,
        };
        assert_eq!(pair.arrow_label(), "obama_1 → born_3");
    }
}
