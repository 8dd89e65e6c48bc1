//! Export Renderer - Composition and Size-Budgeted Encoding
//!
//! Composites elements in ascending z-order onto an RGB canvas, then
//! walks a fixed quality ladder until the JPEG fits the size budget.
//! Per-element problems degrade locally; only an unrenderable canvas is
//! fatal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage, RgbImage};
use log::{debug, info, warn};
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::assets::AssetStore;
use crate::elements::{Canvas, ElementKind, LayoutElement};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static ENCODE_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_encode_attempts() -> u32 {
    ENCODE_ATTEMPTS.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_encode_attempts() {
    ENCODE_ATTEMPTS.store(0, Ordering::SeqCst);
}

/// Hard byte budget for exported creatives.
pub const MAX_EXPORT_BYTES: usize = 500 * 1024;
/// First JPEG quality attempted.
pub const START_QUALITY: u8 = 95;
/// Fixed quality decrement between attempts.
pub const QUALITY_STEP: u8 = 10;
/// No encoding is attempted below this quality.
pub const MIN_QUALITY: u8 = 10;

/// Font size assumed for text elements that don't declare one.
const DEFAULT_FONT_SIZE: u32 = 24;
/// Footprint of the placeholder drawn for unresolvable assets without
/// a declared size.
const PLACEHOLDER_SIZE: f64 = 100.0;
const PLACEHOLDER_BORDER: u32 = 2;
const PLACEHOLDER_GRAY: Rgba<u8> = Rgba([200, 200, 200, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// System font files tried when no catalog font matches.
const FALLBACK_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Canvas dimensions {0}x{1} are not renderable")]
    InvalidCanvas(u32, u32),

    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Export I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Descriptor of one persisted export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub filename: String,
    pub url: String,
    /// Encoded size in kilobytes, unrounded.
    pub size_kb: f64,
    /// JPEG quality the budget search settled on.
    pub quality: u8,
    pub content_hash: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
}

/// Draw order: ascending z-index, ties keep original list order.
pub fn stacked(elements: &[LayoutElement]) -> Vec<&LayoutElement> {
    let mut ordered: Vec<&LayoutElement> = elements.iter().collect();
    ordered.sort_by_key(|el| el.z_index);
    ordered
}

fn parse_color(value: &str) -> Option<Rgba<u8>> {
    csscolorparser::parse(value).ok().map(|c| Rgba(c.to_rgba8()))
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Composites element lists and persists budget-compressed JPEG exports.
pub struct ExportRenderer {
    store: AssetStore,
    fonts_dir: Option<PathBuf>,
}

impl ExportRenderer {
    pub fn new(store: AssetStore, fonts_dir: Option<PathBuf>) -> Self {
        Self { store, fonts_dir }
    }

    /// Render the layout and persist it under a fresh name.
    ///
    /// Never mutates its inputs; the only fatal condition is a canvas
    /// with a zero dimension.
    pub fn render(
        &self,
        canvas: &Canvas,
        elements: &[LayoutElement],
    ) -> Result<ExportArtifact, ExportError> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ExportError::InvalidCanvas(canvas.width, canvas.height));
        }

        let composed = self.compose(canvas, elements);
        let rgb = DynamicImage::ImageRgba8(composed).to_rgb8();
        let (bytes, quality) = compress_to_budget(&rgb)?;
        if bytes.len() > MAX_EXPORT_BYTES {
            warn!(
                "export still {} bytes over budget at quality {}",
                bytes.len() - MAX_EXPORT_BYTES,
                quality
            );
        }

        let (filename, path) = self.store.save_export(&bytes)?;
        info!(
            "exported {} ({} bytes, quality {})",
            path.display(),
            bytes.len(),
            quality
        );

        Ok(ExportArtifact {
            url: format!("/exports/{}", filename),
            filename,
            size_kb: bytes.len() as f64 / 1024.0,
            quality,
            content_hash: sha256_hex(&bytes),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
        })
    }

    fn compose(&self, canvas: &Canvas, elements: &[LayoutElement]) -> RgbaImage {
        let background = parse_color(&canvas.background_color).unwrap_or_else(|| {
            warn!(
                "unparseable background color '{}', using white",
                canvas.background_color
            );
            WHITE
        });

        let mut image = RgbaImage::from_pixel(canvas.width, canvas.height, background);
        let mut fonts = FontCatalog::new(self.fonts_dir.as_deref());

        for el in stacked(elements) {
            match el.kind {
                ElementKind::Text => self.draw_text_element(&mut image, &mut fonts, el),
                ElementKind::Packshot | ElementKind::Image | ElementKind::Logo => {
                    self.draw_asset_element(&mut image, el)
                }
                ElementKind::Shape => draw_shape_element(&mut image, el),
            }
        }

        image
    }

    fn draw_text_element(&self, image: &mut RgbaImage, fonts: &mut FontCatalog, el: &LayoutElement) {
        let Some(text) = el.text.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };
        let color = el
            .color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(BLACK);

        match fonts.resolve(el.font_family.as_deref()) {
            Some(resolved) => {
                // A fallback font ignores the requested size and renders
                // at the fixed default instead.
                let size = if resolved.is_fallback {
                    DEFAULT_FONT_SIZE
                } else {
                    el.font_size.unwrap_or(DEFAULT_FONT_SIZE)
                };
                draw_text(image, &resolved.font, size as f32, el.x, el.y, color, text);
            }
            None => warn!("no display font available, skipping text '{}'", text),
        }
    }

    fn draw_asset_element(&self, image: &mut RgbaImage, el: &LayoutElement) {
        let reference = el.text.as_deref().unwrap_or("");
        let Some(path) = self.store.resolve(reference) else {
            debug!("asset '{}' not found, drawing placeholder", reference);
            draw_placeholder(image, el);
            return;
        };

        let decoded = match image::open(&path) {
            Ok(img) => img.to_rgba8(),
            Err(err) => {
                warn!("failed to decode asset {}: {}", path.display(), err);
                return;
            }
        };

        let asset = match el.explicit_size() {
            Some((w, h)) => imageops::resize(&decoded, w, h, imageops::FilterType::Lanczos3),
            None => decoded,
        };
        imageops::overlay(image, &asset, el.x as i64, el.y as i64);
    }
}

fn draw_shape_element(image: &mut RgbaImage, el: &LayoutElement) {
    let color = el
        .color
        .as_deref()
        .and_then(parse_color)
        .unwrap_or(BLACK);
    fill_rect(image, el.x, el.y, el.width, el.height, color);
}

fn draw_placeholder(image: &mut RgbaImage, el: &LayoutElement) {
    let (w, h) = match el.explicit_size() {
        Some((w, h)) => (f64::from(w), f64::from(h)),
        None => (PLACEHOLDER_SIZE, PLACEHOLDER_SIZE),
    };
    let border = f64::from(PLACEHOLDER_BORDER);
    // Four edges of an outline rectangle.
    fill_rect(image, el.x, el.y, w, border, PLACEHOLDER_GRAY);
    fill_rect(image, el.x, el.y + h - border, w, border, PLACEHOLDER_GRAY);
    fill_rect(image, el.x, el.y, border, h, PLACEHOLDER_GRAY);
    fill_rect(image, el.x + w - border, el.y, border, h, PLACEHOLDER_GRAY);
}

fn fill_rect(image: &mut RgbaImage, x: f64, y: f64, w: f64, h: f64, color: Rgba<u8>) {
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    let x0 = x.max(0.0) as u32;
    let y0 = y.max(0.0) as u32;
    let x1 = ((x + w).min(f64::from(image.width()))).max(0.0) as u32;
    let y1 = ((y + h).min(f64::from(image.height()))).max(0.0) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            image.put_pixel(px, py, color);
        }
    }
}

fn draw_text(
    image: &mut RgbaImage,
    font: &Font<'static>,
    size: f32,
    x: f64,
    y: f64,
    color: Rgba<u8>,
    text: &str,
) {
    let scale = Scale::uniform(size);
    let ascent = font.v_metrics(scale).ascent;
    // Anchor the glyph run so (x, y) is the top-left of the line box.
    let origin = point(x as f32, y as f32 + ascent);

    for glyph in font.layout(text, scale, origin) {
        let Some(bounds) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = gx as i32 + bounds.min.x;
            let py = gy as i32 + bounds.min.y;
            if px < 0 || py < 0 || px >= image.width() as i32 || py >= image.height() as i32 {
                return;
            }
            if coverage <= 0.0 {
                return;
            }
            let dst = image.get_pixel_mut(px as u32, py as u32);
            let inv = 1.0 - coverage;
            for ch in 0..3 {
                dst.0[ch] =
                    (f32::from(color.0[ch]) * coverage + f32::from(dst.0[ch]) * inv) as u8;
            }
            dst.0[3] = 255;
        });
    }
}

/// Encode at descending qualities until the budget is met.
///
/// Fixed schedule: 95, 85, ... down to the floor, at most 9 attempts.
/// The final encoding is accepted even when it still exceeds the budget.
fn compress_to_budget(image: &RgbImage) -> Result<(Vec<u8>, u8), ExportError> {
    let mut quality = START_QUALITY;
    let mut bytes = encode_jpeg(image, quality)?;

    while bytes.len() > MAX_EXPORT_BYTES && quality >= MIN_QUALITY + QUALITY_STEP {
        quality -= QUALITY_STEP;
        bytes = encode_jpeg(image, quality)?;
        debug!("re-encoded at quality {}: {} bytes", quality, bytes.len());
    }

    Ok((bytes, quality))
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    #[cfg(feature = "test-hooks")]
    ENCODE_ATTEMPTS.fetch_add(1, Ordering::SeqCst);

    let mut buf = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

struct ResolvedFont {
    font: Font<'static>,
    /// True when the requested family could not be loaded and a system
    /// default stood in.
    is_fallback: bool,
}

/// Lazily loads fonts from the catalog directory, then system defaults.
struct FontCatalog<'a> {
    fonts_dir: Option<&'a Path>,
    loaded: HashMap<String, Option<Font<'static>>>,
}

impl<'a> FontCatalog<'a> {
    fn new(fonts_dir: Option<&'a Path>) -> Self {
        Self {
            fonts_dir,
            loaded: HashMap::new(),
        }
    }

    fn resolve(&mut self, family: Option<&str>) -> Option<ResolvedFont> {
        if let Some(family) = family {
            if let Some(font) = self.family_font(family) {
                return Some(ResolvedFont {
                    font,
                    is_fallback: false,
                });
            }
            return self.default_font().map(|font| ResolvedFont {
                font,
                is_fallback: true,
            });
        }
        self.default_font().map(|font| ResolvedFont {
            font,
            is_fallback: false,
        })
    }

    fn family_font(&mut self, family: &str) -> Option<Font<'static>> {
        if let Some(cached) = self.loaded.get(family) {
            return cached.clone();
        }
        let font = self
            .fonts_dir
            .map(|dir| dir.join(format!("{}.ttf", family)))
            .and_then(|path| load_font_file(&path));
        self.loaded.insert(family.to_string(), font.clone());
        font
    }

    fn default_font(&mut self) -> Option<Font<'static>> {
        if let Some(cached) = self.loaded.get("") {
            return cached.clone();
        }
        let font = FALLBACK_FONT_PATHS
            .iter()
            .find_map(|path| load_font_file(Path::new(path)));
        self.loaded.insert(String::new(), font.clone());
        font
    }
}

fn load_font_file(path: &Path) -> Option<Font<'static>> {
    let bytes = fs::read(path).ok()?;
    Font::try_from_vec(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementKind;

    fn shape(z_index: i32, id: &str) -> LayoutElement {
        let mut el = LayoutElement::new(ElementKind::Shape, 0.0, 0.0);
        el.z_index = z_index;
        el.id = Some(id.to_string());
        el
    }

    fn ids(ordered: &[&LayoutElement]) -> Vec<String> {
        ordered.iter().map(|el| el.id.clone().unwrap()).collect()
    }

    #[test]
    fn stacking_sorts_by_z_index() {
        let elements = vec![shape(5, "top"), shape(0, "bottom"), shape(2, "middle")];
        assert_eq!(ids(&stacked(&elements)), vec!["bottom", "middle", "top"]);
    }

    #[test]
    fn equal_z_preserves_list_order() {
        let elements = vec![shape(1, "first"), shape(1, "second")];
        assert_eq!(ids(&stacked(&elements)), vec!["first", "second"]);

        let swapped = vec![shape(1, "second"), shape(1, "first")];
        assert_eq!(ids(&stacked(&swapped)), vec!["second", "first"]);
    }

    #[test]
    fn color_parsing_accepts_hex_and_names() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("white"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn blank_canvas_fits_budget_at_first_quality() {
        let image = RgbImage::from_pixel(1200, 1200, image::Rgb([255, 255, 255]));
        let (bytes, quality) = compress_to_budget(&image).unwrap();
        assert_eq!(quality, START_QUALITY);
        assert!(bytes.len() <= MAX_EXPORT_BYTES);
    }

    #[test]
    fn quality_ladder_never_descends_past_floor() {
        // Walk the same schedule the search uses.
        let mut quality = START_QUALITY;
        let mut attempts = vec![quality];
        while quality >= MIN_QUALITY + QUALITY_STEP {
            quality -= QUALITY_STEP;
            attempts.push(quality);
        }
        assert_eq!(attempts, vec![95, 85, 75, 65, 55, 45, 35, 25, 15]);
        assert_eq!(attempts.len(), 9);
    }

    #[test]
    fn fill_rect_clips_out_of_bounds_geometry() {
        let mut image = RgbaImage::from_pixel(10, 10, WHITE);
        fill_rect(&mut image, -5.0, -5.0, 8.0, 8.0, BLACK);
        fill_rect(&mut image, 8.0, 8.0, 50.0, 50.0, BLACK);
        fill_rect(&mut image, 20.0, 20.0, 5.0, 5.0, BLACK);
        assert_eq!(image.get_pixel(0, 0), &BLACK);
        assert_eq!(image.get_pixel(9, 9), &BLACK);
        assert_eq!(image.get_pixel(5, 5), &WHITE);
    }

    #[test]
    fn sha256_hex_is_stable() {
        assert_eq!(sha256_hex(b"creative"), sha256_hex(b"creative"));
        assert_ne!(sha256_hex(b"a"), sha256_hex(b"b"));
    }
}
