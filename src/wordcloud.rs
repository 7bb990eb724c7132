//! # Word cloud
//! Renders the titles of the retained stories into a PNG word cloud.
//!
//! Words are counted case-insensitively with English stopwords removed,
//! then placed largest-first along an Archimedean spiral starting at the
//! canvas centre. Collision checks use a summed-area table over an
//! occupancy mask, so each candidate position is O(1). Glyphs come from a
//! built-in 5x7 bitmap font and words are drawn uppercase. Colours are
//! assigned by rank, so identical input always yields identical bytes.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::WordCloudConfig;
use crate::error::DashboardError;

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const MIN_SCALE: u32 = 2;
const MIN_CANVAS: u32 = 16;
/// Upper bound per side; keeps the occupancy table and PNG buffer bounded.
pub const MAX_CANVAS: u32 = 4096;
/// Free pixels kept around every placed word.
const MARGIN: u32 = 2;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?u)\w[\w']+").expect("word regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did",
        "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during", "each", "else",
        "ever", "few", "for", "from", "further", "get", "had", "hadn't", "has", "hasn't", "have",
        "haven't", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his",
        "how", "however", "i", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself",
        "just", "let's", "me", "more", "most", "my", "myself", "no", "nor", "not", "of", "off",
        "on", "once", "only", "or", "other", "otherwise", "ought", "our", "ours", "ourselves",
        "out", "over", "own", "same", "shall", "she", "should", "shouldn't", "since", "so",
        "some", "such", "than", "that", "that's", "the", "their", "theirs", "them", "themselves",
        "then", "there", "there's", "these", "they", "this", "those", "through", "to", "too",
        "under", "until", "up", "very", "via", "was", "wasn't", "we", "were", "weren't", "what",
        "when", "where", "which", "while", "who", "whom", "why", "with", "won't", "would",
        "wouldn't", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

const PALETTE: [[u8; 3]; 8] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [23, 190, 207],
];

/// Count words in `text`, most frequent first (ties alphabetical),
/// keeping at most `max_words`.
pub fn word_frequencies(text: &str, max_words: usize) -> Vec<(String, u32)> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for m in WORD_RE.find_iter(text) {
        let mut w = m.as_str().to_lowercase();
        if let Some(stripped) = w.strip_suffix("'s") {
            w = stripped.to_string();
        }
        let w = w.trim_matches('\'');
        if w.chars().count() < 2
            || w.chars().all(|c| c.is_ascii_digit())
            || STOPWORDS.contains(w)
        {
            continue;
        }
        *counts.entry(w.to_string()).or_insert(0) += 1;
    }

    let mut out: Vec<(String, u32)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out.truncate(max_words);
    out
}

/// One word as laid out on the canvas. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWord {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub scale: u32,
    pub color: [u8; 3],
}

impl PlacedWord {
    pub fn width(&self) -> u32 {
        text_width(&self.text, self.scale)
    }

    pub fn height(&self) -> u32 {
        GLYPH_H * self.scale
    }
}

#[derive(Debug, Clone)]
pub struct WordCloudRenderer {
    width: u32,
    height: u32,
    max_words: usize,
    background: Rgb<u8>,
}

impl WordCloudRenderer {
    pub fn new(cfg: &WordCloudConfig) -> Result<Self, DashboardError> {
        let background = parse_hex_color(&cfg.background).ok_or_else(|| {
            DashboardError::WordCloud(format!("invalid background colour {:?}", cfg.background))
        })?;
        Ok(Self {
            width: cfg.width.clamp(MIN_CANVAS, MAX_CANVAS),
            height: cfg.height.clamp(MIN_CANVAS, MAX_CANVAS),
            max_words: cfg.max_words,
            background,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn max_scale(&self) -> u32 {
        (self.height / (GLYPH_H * 3)).max(MIN_SCALE)
    }

    /// Place words without drawing them.
    pub fn layout(&self, text: &str) -> Vec<PlacedWord> {
        let freqs = word_frequencies(text, self.max_words);
        let Some(&(_, top)) = freqs.first() else {
            return Vec::new();
        };

        let mut occupancy = Occupancy::new(self.width, self.height);
        let mut placed = Vec::with_capacity(freqs.len());
        let max_scale = self.max_scale();

        for (rank, (word, freq)) in freqs.iter().enumerate() {
            let glyphs: String = word
                .to_uppercase()
                .chars()
                .filter(|c| glyph(*c).is_some())
                .collect();
            if glyphs.is_empty() {
                continue;
            }

            let rel = *freq as f32 / top as f32;
            let wanted = MIN_SCALE as f32 + (max_scale - MIN_SCALE) as f32 * rel;
            let mut scale = (wanted.round() as u32).clamp(MIN_SCALE, max_scale);

            loop {
                let w = text_width(&glyphs, scale) + 2 * MARGIN;
                let h = GLYPH_H * scale + 2 * MARGIN;
                if let Some((x, y)) = self.find_spot(&occupancy, w, h) {
                    occupancy.mark(x, y, w, h);
                    placed.push(PlacedWord {
                        text: glyphs,
                        x: x + MARGIN,
                        y: y + MARGIN,
                        scale,
                        color: PALETTE[rank % PALETTE.len()],
                    });
                    break;
                }
                if scale == MIN_SCALE {
                    break;
                }
                scale -= 1;
            }
        }
        placed
    }

    // Walk an Archimedean spiral out from the centre until the box fits.
    fn find_spot(&self, occ: &Occupancy, w: u32, h: u32) -> Option<(u32, u32)> {
        if w > self.width || h > self.height {
            return None;
        }
        let cx = (self.width - w) as f32 / 2.0;
        let cy = (self.height - h) as f32 / 2.0;
        let aspect = self.height as f32 / self.width as f32;
        let limit = self.width.max(self.height) as f32;

        let mut theta = 0.0f32;
        loop {
            let r = 1.5 * theta;
            if r > limit {
                return None;
            }
            let x = cx + r * theta.cos();
            let y = cy + r * aspect * theta.sin();
            if x >= 0.0 && y >= 0.0 {
                let (xi, yi) = (x as u32, y as u32);
                if xi + w <= self.width && yi + h <= self.height && occ.is_free(xi, yi, w, h) {
                    return Some((xi, yi));
                }
            }
            theta += 0.15;
        }
    }

    /// Lay out and draw. Empty input gives a blank canvas.
    pub fn render(&self, text: &str) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, self.background);
        for word in self.layout(text) {
            draw_word(&mut img, &word);
        }
        img
    }

    pub fn render_png(&self, text: &str) -> Result<Vec<u8>, DashboardError> {
        let img = self.render(text);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| DashboardError::WordCloud(e.to_string()))?;
        Ok(buf)
    }

    /// PNG as a `data:` URI, ready for an `<img src>`.
    pub fn render_data_uri(&self, text: &str) -> Result<String, DashboardError> {
        let png = self.render_png(text)?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
    }
}

fn draw_word(img: &mut RgbImage, word: &PlacedWord) {
    let color = Rgb(word.color);
    let s = word.scale;
    for (i, c) in word.text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let gx = word.x + i as u32 * (GLYPH_W + 1) * s;
        for (ry, bits) in rows.iter().enumerate() {
            for rx in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - rx)) == 0 {
                    continue;
                }
                let px = gx + rx * s;
                let py = word.y + ry as u32 * s;
                for dy in 0..s {
                    for dx in 0..s {
                        if px + dx < img.width() && py + dy < img.height() {
                            img.put_pixel(px + dx, py + dy, color);
                        }
                    }
                }
            }
        }
    }
}

fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * (GLYPH_W + 1) - 1) * scale
}

fn parse_hex_color(s: &str) -> Option<Rgb<u8>> {
    let hex = s.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb([byte(0)?, byte(2)?, byte(4)?]))
}

/// Occupancy mask with a summed-area table for O(1) box queries.
struct Occupancy {
    width: usize,
    height: usize,
    mask: Vec<bool>,
    // (width + 1) x (height + 1), row-major
    sat: Vec<u32>,
}

impl Occupancy {
    fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            mask: vec![false; width * height],
            sat: vec![0; (width + 1) * (height + 1)],
        }
    }

    fn is_free(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        let stride = self.width + 1;
        let at = |xx: usize, yy: usize| self.sat[yy * stride + xx];
        let sum = at(x + w, y + h) + at(x, y) - at(x + w, y) - at(x, y + h);
        sum == 0
    }

    fn mark(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        for yy in y..(y + h).min(self.height) {
            for xx in x..(x + w).min(self.width) {
                self.mask[yy * self.width + xx] = true;
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let stride = self.width + 1;
        for yy in 0..self.height {
            let mut row = 0u32;
            for xx in 0..self.width {
                row += self.mask[yy * self.width + xx] as u32;
                let above = self.sat[yy * stride + xx + 1];
                self.sat[(yy + 1) * stride + xx + 1] = above + row;
            }
        }
    }
}

fn glyph(c: char) -> Option<&'static [u8; 7]> {
    let rows: &'static [u8; 7] = match c {
        'A' => &[0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => &[0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => &[0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => &[0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => &[0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => &[0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => &[0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => &[0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => &[0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => &[0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => &[0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => &[0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => &[0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => &[0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => &[0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => &[0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => &[0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => &[0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => &[0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => &[0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => &[0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => &[0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => &[0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => &[0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => &[0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => &[0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => &[0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => &[0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => &[0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => &[0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => &[0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => &[0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => &[0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => &[0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => &[0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => &[0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '\'' => &[0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> WordCloudRenderer {
        WordCloudRenderer::new(&WordCloudConfig::default()).unwrap()
    }

    #[test]
    fn frequencies_drop_stopwords_and_merge_case() {
        let f = word_frequencies("The AI model and the ai chip. Rust's rise! 2024 x", 10);
        assert_eq!(
            f,
            vec![
                ("ai".to_string(), 2),
                ("chip".to_string(), 1),
                ("model".to_string(), 1),
                ("rise".to_string(), 1),
                ("rust".to_string(), 1),
            ]
        );
    }

    #[test]
    fn frequencies_respect_max_words() {
        let f = word_frequencies("alpha beta gamma delta alpha", 2);
        assert_eq!(f.len(), 2);
        assert_eq!(f[0], ("alpha".to_string(), 2));
    }

    #[test]
    fn layout_has_no_overlaps_and_stays_inside() {
        let r = renderer();
        let text = "Rust compiler release notes Rust async runtime Postgres tuning \
                    AI model launch AI chip startup funding database index Rust";
        let words = r.layout(text);
        assert!(!words.is_empty());
        let (w, h) = r.dimensions();
        for a in &words {
            assert!(a.x + a.width() <= w && a.y + a.height() <= h, "{a:?} out of bounds");
        }
        for (i, a) in words.iter().enumerate() {
            for b in &words[i + 1..] {
                let apart = a.x + a.width() <= b.x
                    || b.x + b.width() <= a.x
                    || a.y + a.height() <= b.y
                    || b.y + b.height() <= a.y;
                assert!(apart, "{a:?} overlaps {b:?}");
            }
        }
        // most frequent word is drawn biggest
        assert_eq!(words[0].text, "RUST");
        assert!(words.iter().all(|p| p.scale <= words[0].scale));
    }

    #[test]
    fn empty_text_is_blank_canvas() {
        let r = renderer();
        assert!(r.layout("").is_empty());
        let img = r.render("   the and of ");
        assert!(img.pixels().all(|p| *p == Rgb([255, 255, 255])));
        let uri = r.render_data_uri("").unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn png_decodes_with_configured_size() {
        let r = renderer();
        let png = r.render_png("Show HN: a tiny word cloud").unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 400));
    }

    #[test]
    fn rendering_is_deterministic() {
        let r = renderer();
        let t = "Launch HN AI tooling AI safety Rust Go";
        assert_eq!(r.render_png(t).unwrap(), r.render_png(t).unwrap());
    }

    #[test]
    fn canvas_size_is_bounded_both_ways() {
        let huge = WordCloudConfig {
            width: 100_000,
            height: 100_000,
            ..WordCloudConfig::default()
        };
        let r = WordCloudRenderer::new(&huge).unwrap();
        assert_eq!(r.dimensions(), (MAX_CANVAS, MAX_CANVAS));

        let words = r.layout("rust rust tokio");
        assert_eq!(words.len(), 2);
        for p in &words {
            assert!(p.x + p.width() <= MAX_CANVAS && p.y + p.height() <= MAX_CANVAS);
        }

        let tiny = WordCloudConfig {
            width: 0,
            height: 3,
            ..WordCloudConfig::default()
        };
        let r = WordCloudRenderer::new(&tiny).unwrap();
        assert_eq!(r.dimensions(), (MIN_CANVAS, MIN_CANVAS));
    }

    #[test]
    fn bad_background_is_rejected() {
        let cfg = WordCloudConfig {
            background: "white".into(),
            ..WordCloudConfig::default()
        };
        assert!(matches!(
            WordCloudRenderer::new(&cfg),
            Err(DashboardError::WordCloud(_))
        ));
        assert_eq!(parse_hex_color("#0a0B0c"), Some(Rgb([10, 11, 12])));
    }
}
