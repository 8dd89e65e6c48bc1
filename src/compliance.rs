//! Compliance Rule Engine - Brand & Legal Checks
//!
//! Each rule is an independent pure check over a canvas + element list.
//! Rule failures are first-class results, never errors.

use serde::{Deserialize, Serialize};

use crate::elements::{Canvas, ElementKind, LayoutElement};

/// Minimum canvas width before the dimensions rule warns.
pub const MIN_CANVAS_WIDTH: u32 = 600;
/// Exclusion band at the top of a 9:16 canvas, in pixels.
pub const SAFE_ZONE_TOP: f64 = 200.0;
/// Exclusion band at the bottom of a 9:16 canvas, in pixels.
pub const SAFE_ZONE_BOTTOM: f64 = 250.0;
/// Maximum number of packshot elements per creative.
pub const MAX_PACKSHOTS: usize = 3;

/// Claims that legal has blocked from creative copy.
pub const FORBIDDEN_PHRASES: [&str; 8] = [
    "price match",
    "money back",
    "competition",
    "win",
    "sustainable",
    "charity",
    "discount",
    "% off",
];

/// Verdict of a single rule, with diagnostic detail even on pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub name: String,
    pub passed: bool,
    pub details: String,
    pub suggested_fix: Option<String>,
}

impl ComplianceCheck {
    fn pass(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            details,
            suggested_fix: None,
        }
    }

    fn fail(name: &str, details: String, suggested_fix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            details,
            suggested_fix: suggested_fix.map(str::to_string),
        }
    }
}

/// Full battery result. `overall_pass` is recomputed on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub overall_pass: bool,
    pub checks: Vec<ComplianceCheck>,
}

/// A single compliance rule - produces one check result per run.
pub trait ComplianceRule {
    fn name(&self) -> &'static str;
    fn check(&self, canvas: &Canvas, elements: &[LayoutElement]) -> ComplianceCheck;
}

// --- Concrete Rules ---

/// Warns on canvases narrower than the minimum production width.
pub struct DimensionsRule;

impl ComplianceRule for DimensionsRule {
    fn name(&self) -> &'static str {
        "dimensions"
    }

    fn check(&self, canvas: &Canvas, _elements: &[LayoutElement]) -> ComplianceCheck {
        let mut details = format!("Dimensions: {}x{}", canvas.width, canvas.height);
        if canvas.width < MIN_CANVAS_WIDTH {
            details.push_str(&format!(". Warning: Width < {}px.", MIN_CANVAS_WIDTH));
            ComplianceCheck::fail(self.name(), details, None)
        } else {
            ComplianceCheck::pass(self.name(), details)
        }
    }
}

/// Keeps content out of the platform chrome bands on 9:16 canvases.
///
/// Text elements without an explicit height are approximated by their
/// font size. A crude box model, not true text metrics.
pub struct SafeZoneRule;

/// Effective height used by the band checks: explicit height, else font
/// size, else the supplied default.
pub(crate) fn effective_height(el: &LayoutElement, missing: f64) -> f64 {
    if el.height > 0.0 {
        el.height
    } else if let Some(size) = el.font_size {
        f64::from(size)
    } else {
        missing
    }
}

impl ComplianceRule for SafeZoneRule {
    fn name(&self) -> &'static str {
        "safe_zones"
    }

    fn check(&self, canvas: &Canvas, elements: &[LayoutElement]) -> ComplianceCheck {
        if !canvas.is_story_format() {
            return ComplianceCheck::pass(self.name(), "Safe zones respected.".to_string());
        }

        let max_y = f64::from(canvas.height) - SAFE_ZONE_BOTTOM;
        let mut violations = Vec::new();

        for el in elements {
            let bottom = el.y + effective_height(el, 0.0);
            if el.y < SAFE_ZONE_TOP {
                violations.push(format!(
                    "'{}' too high (Y:{} < {})",
                    el.label(),
                    el.y as i64,
                    SAFE_ZONE_TOP as i64
                ));
            }
            if bottom > max_y {
                violations.push(format!(
                    "'{}' too low (Bottom:{} > {})",
                    el.label(),
                    bottom as i64,
                    max_y as i64
                ));
            }
        }

        if violations.is_empty() {
            ComplianceCheck::pass(self.name(), "Safe zones respected.".to_string())
        } else {
            ComplianceCheck::fail(
                self.name(),
                format!("9:16 Safe Zone Violation: {}", violations.join("; ")),
                Some("Move elements out of red zones."),
            )
        }
    }
}

/// Scans text copy for claims legal has blocked.
pub struct ForbiddenCopyRule;

impl ComplianceRule for ForbiddenCopyRule {
    fn name(&self) -> &'static str {
        "forbidden_copy"
    }

    fn check(&self, _canvas: &Canvas, elements: &[LayoutElement]) -> ComplianceCheck {
        let mut found = Vec::new();
        for el in elements {
            if el.kind != ElementKind::Text {
                continue;
            }
            let Some(text) = el.text.as_deref() else {
                continue;
            };
            let lower = text.to_lowercase();
            for phrase in FORBIDDEN_PHRASES {
                if lower.contains(phrase) {
                    found.push(format!("Forbidden: '{}' in '{}'", phrase, text));
                }
            }
        }

        if found.is_empty() {
            ComplianceCheck::pass(self.name(), "No forbidden copy found.".to_string())
        } else {
            ComplianceCheck::fail(self.name(), found.join("; "), Some("Remove forbidden claims."))
        }
    }
}

/// Caps the number of packshots per creative.
pub struct PackshotCountRule;

impl ComplianceRule for PackshotCountRule {
    fn name(&self) -> &'static str {
        "packshot_rules"
    }

    fn check(&self, _canvas: &Canvas, elements: &[LayoutElement]) -> ComplianceCheck {
        let count = elements
            .iter()
            .filter(|el| el.kind == ElementKind::Packshot)
            .count();

        if count > MAX_PACKSHOTS {
            ComplianceCheck::fail(
                self.name(),
                format!("Too many packshots: {} > {}", count, MAX_PACKSHOTS),
                None,
            )
        } else {
            ComplianceCheck::pass(self.name(), format!("Packshot count: {}", count))
        }
    }
}

/// Runs the fixed rule battery in registration order.
pub struct Validator {
    rules: Vec<Box<dyn ComplianceRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DimensionsRule),
                Box::new(SafeZoneRule),
                Box::new(ForbiddenCopyRule),
                Box::new(PackshotCountRule),
            ],
        }
    }

    pub fn validate(&self, canvas: &Canvas, elements: &[LayoutElement]) -> ValidationReport {
        let checks: Vec<ComplianceCheck> = self
            .rules
            .iter()
            .map(|rule| rule.check(canvas, elements))
            .collect();

        let overall_pass = checks.iter().all(|c| c.passed);
        ValidationReport {
            overall_pass,
            checks,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
