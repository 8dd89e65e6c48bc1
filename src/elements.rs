//! Layout Element Model - Canonical Typed Primitives
//!
//! Element lists are immutable inputs to validation, auto-fix and export.
//! Unknown wire fields are ignored for forward compatibility.

use serde::{Deserialize, Serialize};

/// The closed set of visual primitives a creative is assembled from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Packshot,
    Text,
    Shape,
    Image,
    Logo,
}

/// Promotional badge subtype carried by value tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TileType {
    New,
    White,
    Clubcard,
}

/// A positioned visual primitive in canvas space.
///
/// `text` is dual-purpose: literal copy for `Text` elements, an asset
/// reference string for `Packshot`/`Image`/`Logo`. `width`/`height` of
/// zero mean intrinsic/unspecified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutElement {
    #[serde(alias = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub z_index: i32,
    /// Client-assigned identifier, passed through untouched.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub tile_type: Option<TileType>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl LayoutElement {
    /// Bare element of a given kind at a position. Test and proposal helper.
    pub fn new(kind: ElementKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            x,
            y,
            width: 0.0,
            height: 0.0,
            text: None,
            font_size: None,
            font_family: None,
            color: None,
            z_index: 0,
            id: None,
            tile_type: None,
            price: None,
            regular_price: None,
            end_date: None,
        }
    }

    /// Explicit size when both dimensions are set, `None` when intrinsic.
    pub fn explicit_size(&self) -> Option<(u32, u32)> {
        if self.width > 0.0 && self.height > 0.0 {
            Some((self.width as u32, self.height as u32))
        } else {
            None
        }
    }

    /// Label used in diagnostics: the element's text, or its kind.
    pub fn label(&self) -> String {
        match self.text.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("{:?}", self.kind).to_lowercase(),
        }
    }
}

/// Target drawing surface descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_background")]
    pub background_color: String,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background_color: default_background(),
        }
    }

    /// The 9:16 story convention that safe zones apply to.
    pub fn is_story_format(&self) -> bool {
        self.width == 1080 && self.height == 1920
    }
}
