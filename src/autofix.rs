//! Auto-Fix Transformer - Open-Loop Geometry Correction
//!
//! Produces a corrected copy of the element list without re-running the
//! rule engine. Content violations (forbidden copy, packshot count) need
//! semantic changes and are left untouched; callers re-validate after
//! fixing.

use crate::compliance::{effective_height, SAFE_ZONE_BOTTOM, SAFE_ZONE_TOP};
use crate::elements::{ElementKind, LayoutElement};

/// Gap kept between a repositioned element and the band it violated.
const SNAP_MARGIN: f64 = 10.0;
/// Smallest legible font size for text elements, in points.
const MIN_FONT_SIZE: u32 = 24;
/// Height assumed for elements with neither height nor font size.
const FALLBACK_HEIGHT: f64 = 50.0;

/// Applies deterministic corrections, returning a new list of the same
/// length and order. Inputs are never mutated.
///
/// Band repairs run sequentially per element: the bottom correction sees
/// a y already moved by the top correction, so an element violating both
/// bands ends up wherever the bottom rule puts it. Last rule wins.
pub fn auto_fix_elements(elements: &[LayoutElement], width: u32, height: u32) -> Vec<LayoutElement> {
    let is_story = width == 1080 && height == 1920;
    let max_y = f64::from(height) - SAFE_ZONE_BOTTOM;

    elements
        .iter()
        .map(|el| {
            let mut fixed = el.clone();

            if is_story {
                if fixed.y < SAFE_ZONE_TOP {
                    fixed.y = SAFE_ZONE_TOP + SNAP_MARGIN;
                }

                let el_height = effective_height(&fixed, FALLBACK_HEIGHT);
                if fixed.y + el_height > max_y {
                    fixed.y = max_y - el_height - SNAP_MARGIN;
                }
            }

            if fixed.kind == ElementKind::Text {
                if let Some(size) = fixed.font_size {
                    if size < MIN_FONT_SIZE {
                        fixed.font_size = Some(MIN_FONT_SIZE);
                    }
                }
            }

            fixed
        })
        .collect()
}
