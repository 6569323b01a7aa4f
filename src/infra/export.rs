// ============================================================
// Layer 6 — Artifact Export
// ============================================================
// Writes the two downloadable artifacts:
//
//   attention_heatmap.png     — the rendered heatmap raster
//   top_attention_scores.csv  — the ranked pairs, two columns:
//                               "Source → Target" and "Score"
//                               (score fixed to 2 decimals)
//
// Example CSV output:
//   Source → Target,Score
//   obama_1 → born_3,0.21
//   born_3 → obama_1,0.17
//
// CSV writing is plain line-oriented I/O; the labels and header
// contain no commas, so no quoting is needed.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::attention::AttentionPair;
use crate::viz::heatmap::Heatmap;

/// File name of the heatmap artifact (MIME image/png).
pub const HEATMAP_FILE: &str = "attention_heatmap.png";
/// File name of the scores artifact (MIME text/csv).
pub const SCORES_FILE: &str = "top_attention_scores.csv";

/// Writes artifacts into one output directory.
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer over a directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir: PathBuf = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Encode and write the heatmap PNG; returns its path.
    pub fn write_heatmap(&self, heatmap: &Heatmap) -> Result<PathBuf> {
        let path = self.dir.join(HEATMAP_FILE);
        fs::write(&path, heatmap.png_bytes()?)
            .with_context(|| format!("Cannot write heatmap to '{}'", path.display()))?;
        tracing::info!("Wrote heatmap to '{}'", path.display());
        Ok(path)
    }

    /// Write the ranked pairs CSV; returns its path.
    pub fn write_scores(&self, pairs: &[AttentionPair]) -> Result<PathBuf> {
        let path = self.dir.join(SCORES_FILE);
        fs::write(&path, scores_csv(pairs))
            .with_context(|| format!("Cannot write scores to '{}'", path.display()))?;
        tracing::info!("Wrote {} attention pairs to '{}'", pairs.len(), path.display());
        Ok(path)
    }
}

/// The CSV body for a ranked pair list.
pub fn scores_csv(pairs: &[AttentionPair]) -> String {
    let mut out = String::from("Source → Target,Score\n");
    for pair in pairs {
        out.push_str(&format!("{},{:.2}\n", pair.arrow_label(), pair.score));
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn pair(source: &str, i: usize, target: &str, j: usize, score: f32) -> AttentionPair {
        AttentionPair {
            source: format!("{source}_{i}"),
            target: format!("{target}_{j}"),
            source_index: i,
            target_index: j,
            score,
        }
    }

    #[test]
    fn test_csv_format_matches_export_contract() {
        let pairs = vec![
            pair("obama", 1, "born", 3, 0.214),
            pair("born", 3, "obama", 1, 0.168),
        ];
        let csv = scores_csv(&pairs);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Source → Target,Score");
        // Scores come out in 2-decimal fixed format
        assert_eq!(lines[1], "obama_1 → born_3,0.21");
        assert_eq!(lines[2], "born_3 → obama_1,0.17");
    }

    #[test]
    fn test_csv_of_no_pairs_is_header_only() {
        assert_eq!(scores_csv(&[]), "Source → Target,Score\n");
    }

    #[test]
    fn test_writer_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path()).unwrap();

        let path = writer.write_scores(&[pair("a", 0, "b", 1, 0.5)]).unwrap();
        assert_eq!(path.file_name().unwrap(), SCORES_FILE);
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.ends_with("a_0 → b_1,0.50\n"));
    }
}
