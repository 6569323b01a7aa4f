// ============================================================
// Layer 7 — Heatmap Renderer
// ============================================================
// Paints an N x N attention matrix as a square cell grid with
// token labels on both axes, a title strip, and a colourbar.
//
// Figure sizing follows the token count but is capped so long
// inputs cannot produce unbounded images: the edge is
// min(0.6 * N + 1, 10) "units", rasterised at 100 px per unit.
//
// Cell colours normalise the matrix over its own min/max range
// before sampling the palette; a constant matrix renders at the
// palette midpoint.

use anyhow::{anyhow, bail, Result};
use ndarray::Array3;

use crate::domain::attention::AttentionMatrix;
use crate::domain::token::TokenSequence;
use crate::viz::palette::Palette;

const UNITS_PER_TOKEN: f32 = 0.6;
const BASE_UNITS: f32 = 1.0;
const MAX_UNITS: f32 = 10.0;
const PX_PER_UNIT: f32 = 100.0;

const MARGIN_LEFT: usize = 96;
const MARGIN_TOP: usize = 24;
const MARGIN_BOTTOM: usize = 64;
const COLORBAR_AREA: usize = 48;

const BACKGROUND: [u8; 3] = [255, 255, 255];
const FRAME: [u8; 3] = [96, 96, 96];
const TEXT: [u8; 3] = [33, 33, 33];

const TITLE: &str = "TOKEN-TO-TOKEN SELF-ATTENTION";

/// A rendered heatmap: an RGB raster plus PNG export.
pub struct Heatmap {
    pixels: Array3<u8>,
}

impl Heatmap {
    pub fn width(&self) -> usize {
        self.pixels.shape()[1]
    }

    pub fn height(&self) -> usize {
        self.pixels.shape()[0]
    }

    /// RGB value at (x, y). Coordinates must be inside the image.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        [
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
        ]
    }

    /// Encode the raster as PNG bytes.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let (width, height) = (self.width(), self.height());
        let raw = self
            .pixels
            .as_slice()
            .ok_or_else(|| anyhow!("heatmap pixel buffer is not contiguous"))?
            .to_vec();
        let img = image::RgbImage::from_raw(width as u32, height as u32, raw)
            .ok_or_else(|| anyhow!("heatmap pixel buffer does not match its dimensions"))?;
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Square image edge in pixels for a given token count:
/// min(0.6 * N + 1, 10) units at 100 px per unit.
pub fn edge_px(token_count: usize) -> usize {
    let units = (UNITS_PER_TOKEN * token_count as f32 + BASE_UNITS).min(MAX_UNITS);
    (units * PX_PER_UNIT).round() as usize
}

/// Render the matrix as a heatmap. Tokens label rows (left) and
/// columns (bottom); label density adapts to cell size.
pub fn render(
    tokens: &TokenSequence,
    matrix: &AttentionMatrix,
    palette: Palette,
) -> Result<Heatmap> {
    if tokens.len() != matrix.len() {
        bail!(
            "token count {} does not match attention matrix dimension {}",
            tokens.len(),
            matrix.len(),
        );
    }
    if matrix.is_empty() {
        bail!("nothing to render: the token sequence is empty");
    }

    let n = tokens.len();
    let edge = edge_px(n);
    let mut canvas = Canvas::new(edge, edge);

    // Grid region between the margins
    let gx0 = MARGIN_LEFT;
    let gx1 = edge - COLORBAR_AREA;
    let gy0 = MARGIN_TOP;
    let gy1 = edge - MARGIN_BOTTOM;
    let grid_w = gx1 - gx0;
    let grid_h = gy1 - gy0;

    let (min, max) = matrix.value_range()?;
    let span = max - min;
    let normalise = |value: f32| -> f32 {
        if span <= f32::EPSILON {
            // A flat matrix sits at the palette midpoint
            0.5
        } else {
            (value - min) / span
        }
    };

    // Cells, tiled with integer boundaries so the grid fills exactly
    for i in 0..n {
        let y0 = gy0 + i * grid_h / n;
        let y1 = gy0 + (i + 1) * grid_h / n;
        for j in 0..n {
            let x0 = gx0 + j * grid_w / n;
            let x1 = gx0 + (j + 1) * grid_w / n;
            let color = palette.sample(normalise(matrix.get(i, j)));
            canvas.fill_rect(x0, y0, x1, y1, color);
        }
    }
    canvas.draw_border(gx0, gy0, gx1, gy1, FRAME);

    canvas.draw_text(MARGIN_LEFT, 8, TITLE, TEXT);
    draw_row_labels(&mut canvas, tokens, gy0, grid_h);
    draw_col_labels(&mut canvas, tokens, gx0, gy1, grid_w);
    draw_colorbar(&mut canvas, palette, gx1, gy0, gy1, min, max);

    Ok(Heatmap { pixels: canvas.into_pixels() })
}

fn draw_row_labels(
    canvas: &mut Canvas,
    tokens: &TokenSequence,
    gy0: usize,
    grid_h: usize,
) {
    let n = tokens.len();
    let stride = label_stride(n, grid_h);
    let max_chars = ((MARGIN_LEFT - 12) / 4).min(16);
    for (i, token) in tokens.iter().enumerate() {
        if i % stride != 0 {
            continue;
        }
        let y_center = gy0 + (2 * i + 1) * grid_h / (2 * n);
        let label = clip_label(token, max_chars);
        canvas.draw_text(4, y_center.saturating_sub(2), &label, TEXT);
    }
}

fn draw_col_labels(
    canvas: &mut Canvas,
    tokens: &TokenSequence,
    gx0: usize,
    gy1: usize,
    grid_w: usize,
) {
    let n = tokens.len();
    let stride = label_stride(n, grid_w);
    let cell_w = grid_w / n;
    let max_chars = ((cell_w * stride).saturating_sub(4) / 4).clamp(1, 12);
    for (j, token) in tokens.iter().enumerate() {
        if j % stride != 0 {
            continue;
        }
        let x0 = gx0 + j * grid_w / n;
        let label = clip_label(token, max_chars);
        canvas.draw_text(x0 + 2, gy1 + 6, &label, TEXT);
    }
}

fn draw_colorbar(
    canvas: &mut Canvas,
    palette: Palette,
    gx1: usize,
    gy0: usize,
    gy1: usize,
    min: f32,
    max: f32,
) {
    let bar_x0 = gx1 + 12;
    let bar_x1 = bar_x0 + 14;
    let bar_h = gy1 - gy0;
    if bar_h < 2 {
        return;
    }
    for y in gy0..gy1 {
        // Highest value at the top of the bar
        let t = 1.0 - (y - gy0) as f32 / (bar_h - 1) as f32;
        canvas.fill_rect(bar_x0, y, bar_x1, y + 1, palette.sample(t));
    }
    canvas.draw_border(bar_x0, gy0, bar_x1, gy1, FRAME);
    canvas.draw_text(bar_x1 + 2, gy0, &format!("{max:.2}"), TEXT);
    canvas.draw_text(bar_x1 + 2, gy1.saturating_sub(5), &format!("{min:.2}"), TEXT);
}

/// Smallest label stride that leaves at least 8 px per label.
fn label_stride(n: usize, extent: usize) -> usize {
    if extent == 0 {
        return n.max(1);
    }
    ((8 * n + extent - 1) / extent).max(1)
}

/// Printable, bounded label text: non-graphic characters become
/// '?', long tokens are cut with a ".." marker.
fn clip_label(token: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (count, ch) in token.chars().enumerate() {
        if count >= max_chars {
            out.push_str("..");
            break;
        }
        out.push(if ch.is_ascii_graphic() { ch } else { '?' });
    }
    out
}

// ─── Raster canvas ────────────────────────────────────────────────────────────
// Pixel-level drawing onto a row-major RGB buffer. All drawing
// is bounds-clipped, never panicking on out-of-range shapes.

struct Canvas {
    pixels: Array3<u8>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        let pixels = Array3::<u8>::zeros((height, width, 3));
        let mut canvas = Self { pixels };
        canvas.fill_rect(0, 0, width, height, BACKGROUND);
        canvas
    }

    fn dims(&self) -> (usize, usize) {
        let shape = self.pixels.shape();
        (shape[1], shape[0])
    }

    fn into_pixels(self) -> Array3<u8> {
        self.pixels
    }

    fn put_pixel(&mut self, x: usize, y: usize, color: [u8; 3]) {
        let (width, height) = self.dims();
        if x < width && y < height {
            self.pixels[[y, x, 0]] = color[0];
            self.pixels[[y, x, 1]] = color[1];
            self.pixels[[y, x, 2]] = color[2];
        }
    }

    fn fill_rect(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, color: [u8; 3]) {
        let (width, height) = self.dims();
        for y in y0..y1.min(height) {
            for x in x0..x1.min(width) {
                self.pixels[[y, x, 0]] = color[0];
                self.pixels[[y, x, 1]] = color[1];
                self.pixels[[y, x, 2]] = color[2];
            }
        }
    }

    fn draw_border(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, color: [u8; 3]) {
        if x1 <= x0 || y1 <= y0 {
            return;
        }
        for x in x0..x1 {
            self.put_pixel(x, y0, color);
            self.put_pixel(x, y1 - 1, color);
        }
        for y in y0..y1 {
            self.put_pixel(x0, y, color);
            self.put_pixel(x1 - 1, y, color);
        }
    }

    /// Draw text with the 3x5 glyph font; advances 4 px per char.
    fn draw_text(&mut self, x: usize, y: usize, text: &str, color: [u8; 3]) {
        let (width, height) = self.dims();
        if y + 5 > height || x >= width {
            return;
        }
        let mut cursor = x;
        for ch in text.chars() {
            if cursor + 3 > width {
                break;
            }
            let glyph = glyph_bits(ch.to_ascii_uppercase());
            for (row, pattern) in glyph.iter().enumerate() {
                for col in 0..3 {
                    if (pattern >> (2 - col)) & 1 == 1 {
                        self.put_pixel(cursor + col, y + row, color);
                    }
                }
            }
            cursor += 4;
        }
    }
}

const fn glyph_bits(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b110, 0b100, 0b110, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b110, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b010, 0b010, 0b010, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b110, 0b001, 0b010, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '"' => [0b101, 0b101, 0b000, 0b000, 0b000],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '\\' => [0b100, 0b100, 0b010, 0b001, 0b001],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '[' => [0b011, 0b010, 0b010, 0b010, 0b011],
        ']' => [0b110, 0b010, 0b010, 0b010, 0b110],
        '<' => [0b001, 0b010, 0b100, 0b010, 0b001],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '|' => [0b010, 0b010, 0b010, 0b010, 0b010],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '*' => [0b101, 0b010, 0b101, 0b000, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '@' => [0b011, 0b101, 0b101, 0b100, 0b011],
        '&' => [0b010, 0b101, 0b010, 0b101, 0b011],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b010, 0b101, 0b010, 0b101, 0b010],
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attention::AttentionMatrix;
    use crate::domain::token::TokenSequence;

    fn seq(tokens: &[&str]) -> TokenSequence {
        TokenSequence::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    fn uniform_matrix(n: usize) -> AttentionMatrix {
        AttentionMatrix::new(n, vec![1.0 / n as f32; n * n]).unwrap()
    }

    #[test]
    fn test_edge_scales_with_token_count() {
        assert_eq!(edge_px(5), 400); // (0.6 * 5 + 1) * 100
        assert_eq!(edge_px(10), 700);
    }

    #[test]
    fn test_edge_is_capped() {
        assert_eq!(edge_px(15), 1000);
        assert_eq!(edge_px(200), 1000);
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let tokens = seq(&["[CLS]", "the", "dog", "ran", "[SEP]"]);
        let heatmap = render(&tokens, &uniform_matrix(5), Palette::Viridis).unwrap();
        let bytes = heatmap.png_bytes().unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 400);
        assert_eq!(decoded.height(), 400);
    }

    #[test]
    fn test_large_input_stays_capped() {
        let names: Vec<String> = (0..40).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let tokens = seq(&refs);
        let heatmap = render(&tokens, &uniform_matrix(40), Palette::Magma).unwrap();
        assert_eq!(heatmap.width(), 1000);
        assert_eq!(heatmap.height(), 1000);
    }

    #[test]
    fn test_cells_use_normalised_palette_colours() {
        let tokens = seq(&["a", "b"]);
        let matrix = AttentionMatrix::new(2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let heatmap = render(&tokens, &matrix, Palette::Coolwarm).unwrap();

        // Grid for n=2 spans x 96..172, y 24..156; cell centres:
        let hot = heatmap.pixel(115, 57); // cell (0,0), value 1.0
        let cold = heatmap.pixel(153, 57); // cell (0,1), value 0.0
        assert_eq!(hot, Palette::Coolwarm.sample(1.0));
        assert_eq!(cold, Palette::Coolwarm.sample(0.0));
    }

    #[test]
    fn test_flat_matrix_renders_midpoint() {
        let tokens = seq(&["a", "b"]);
        let heatmap = render(&tokens, &uniform_matrix(2), Palette::Viridis).unwrap();
        assert_eq!(heatmap.pixel(115, 57), Palette::Viridis.sample(0.5));
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let tokens = seq(&["a", "b", "c"]);
        assert!(render(&tokens, &uniform_matrix(2), Palette::Viridis).is_err());
    }

    #[test]
    fn test_empty_matrix_is_an_error() {
        let tokens = seq(&[]);
        assert!(render(&tokens, &AttentionMatrix::empty(), Palette::Viridis).is_err());
    }

    #[test]
    fn test_clip_label_bounds_and_sanitises() {
        assert_eq!(clip_label("dog", 8), "dog");
        assert_eq!(clip_label("extraordinarily", 6), "extrao..");
        assert_eq!(clip_label("caf\u{00e9}", 8), "caf?");
    }
}
