//! Layout Proposals - Deterministic Starting Points
//!
//! Pure data construction: three fixed arrangements for a packshot on a
//! square canvas. Proposals are meant to be edited and re-validated by
//! the caller, not guaranteed compliant.

use serde::{Deserialize, Serialize};

use crate::elements::{ElementKind, LayoutElement, TileType};

/// Default square canvas proposals are laid out for.
pub const DEFAULT_CANVAS_SIZE: u32 = 1200;

const TEXT_COLOR: &str = "#000000";
const TAG_COLOR: &str = "#00539F";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutProposal {
    pub id: String,
    pub name: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub elements: Vec<LayoutElement>,
}

fn packshot(x: f64, y: f64, reference: &str) -> LayoutElement {
    let mut el = LayoutElement::new(ElementKind::Packshot, x, y);
    el.width = 500.0;
    el.height = 500.0;
    el.text = Some(reference.to_string());
    el.z_index = 1;
    el
}

fn headline(x: f64, y: f64, copy: &str, font_size: u32) -> LayoutElement {
    let mut el = LayoutElement::new(ElementKind::Text, x, y);
    el.text = Some(copy.to_string());
    el.font_size = Some(font_size);
    el.font_family = Some("Arial".to_string());
    el.color = Some(TEXT_COLOR.to_string());
    el.z_index = 2;
    el
}

/// Three deterministic arrangements for the given packshot reference.
pub fn suggest_layouts(
    packshot_ref: &str,
    canvas_width: u32,
    canvas_height: u32,
) -> Vec<LayoutProposal> {
    let mut value_tile = LayoutElement::new(ElementKind::Text, 900.0, 100.0);
    value_tile.width = 200.0;
    value_tile.height = 200.0;
    value_tile.text = Some(String::new());
    value_tile.tile_type = Some(TileType::New);
    value_tile.z_index = 3;

    let packshot_left = LayoutProposal {
        id: "layout_1".to_string(),
        name: "Packshot Left".to_string(),
        canvas_width,
        canvas_height,
        elements: vec![
            packshot(100.0, 300.0, packshot_ref),
            headline(650.0, 400.0, "Big Headline", 80),
            headline(650.0, 520.0, "Subheading", 40),
            value_tile,
        ],
    };

    let mut tag = headline(100.0, 900.0, "Only in store", 30);
    tag.color = Some(TAG_COLOR.to_string());

    let centered = LayoutProposal {
        id: "layout_2".to_string(),
        name: "Centered Focus".to_string(),
        canvas_width,
        canvas_height,
        elements: vec![
            headline(300.0, 100.0, "Main Headline", 80),
            packshot(350.0, 300.0, packshot_ref),
            tag,
        ],
    };

    let mut panel = LayoutElement::new(ElementKind::Shape, 0.0, 0.0);
    panel.width = 600.0;
    panel.height = f64::from(canvas_height);
    panel.color = Some("#f0f0f0".to_string());

    let split = LayoutProposal {
        id: "layout_3".to_string(),
        name: "Split View".to_string(),
        canvas_width,
        canvas_height,
        elements: vec![
            panel,
            packshot(50.0, 350.0, packshot_ref),
            headline(650.0, 300.0, "Feature Text", 70),
        ],
    };

    vec![packshot_left, centered, split]
}
