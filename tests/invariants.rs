//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of the compliance,
//! auto-fix and export operations.

use creativeos_core::{
    pipeline::CreativePipeline,
    AssetStore, Canvas, ElementKind, ExportRequest, FixRequest, LayoutElement, ValidateRequest,
};

fn create_pipeline() -> (tempfile::TempDir, CreativePipeline) {
    let dir = tempfile::tempdir().unwrap();
    let store = AssetStore::new(dir.path().join("uploads"), dir.path().join("exports"));
    let pipeline = CreativePipeline::new(store, None);
    (dir, pipeline)
}

fn text_element(y: f64, font_size: u32, text: &str) -> LayoutElement {
    let mut el = LayoutElement::new(ElementKind::Text, 100.0, y);
    el.font_size = Some(font_size);
    el.text = Some(text.to_string());
    el
}

fn validate(pipeline: &CreativePipeline, canvas: Canvas, elements: Vec<LayoutElement>) -> creativeos_core::ValidationReport {
    pipeline.validate(&ValidateRequest { canvas, elements })
}

#[test]
fn invariant_report_always_has_full_battery() {
    let (_dir, pipeline) = create_pipeline();
    let report = validate(&pipeline, Canvas::new(1080, 1920), vec![]);

    let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["dimensions", "safe_zones", "forbidden_copy", "packshot_rules"]
    );
    for check in &report.checks {
        assert!(!check.details.is_empty());
    }
    assert!(report.overall_pass);
}

#[test]
fn invariant_safe_zones_ignore_non_story_canvases() {
    let (_dir, pipeline) = create_pipeline();

    // Placements that would violate both bands on 1080x1920.
    for (width, height) in [(1080, 1080), (1200, 1920), (600, 800)] {
        let report = validate(
            &pipeline,
            Canvas::new(width, height),
            vec![text_element(50.0, 40, "Header"), text_element(1900.0, 40, "Footer")],
        );
        let safe = &report.checks[1];
        assert_eq!(safe.name, "safe_zones");
        assert!(safe.passed, "{}x{} should not enforce bands", width, height);
    }
}

#[test]
fn invariant_story_safe_zone_scenarios() {
    let (_dir, pipeline) = create_pipeline();
    let canvas = Canvas::new(1080, 1920);

    // Too high: y=100 inside the top band.
    let report = validate(&pipeline, canvas.clone(), vec![text_element(100.0, 50, "Header")]);
    let safe = &report.checks[1];
    assert!(!safe.passed);
    assert!(safe.details.contains("too high"));
    assert!(!safe.details.contains("too low"));

    // Too low: bottom 1850 crosses 1670.
    let report = validate(&pipeline, canvas.clone(), vec![text_element(1800.0, 50, "Footer")]);
    let safe = &report.checks[1];
    assert!(!safe.passed);
    assert!(safe.details.contains("too low"));

    // Clear of both bands: y=300, bottom 350.
    let report = validate(&pipeline, canvas, vec![text_element(300.0, 50, "Body")]);
    assert!(report.checks[1].passed);
}

#[test]
fn invariant_forbidden_phrase_surfaces_verbatim() {
    let (_dir, pipeline) = create_pipeline();
    let report = validate(
        &pipeline,
        Canvas::new(1200, 1200),
        vec![text_element(500.0, 40, "Get 50% discount now!")],
    );

    assert!(!report.overall_pass);
    let copy = &report.checks[2];
    assert_eq!(copy.name, "forbidden_copy");
    assert!(!copy.passed);
    assert!(copy.details.contains("discount"));
    assert!(copy.details.contains("Get 50% discount now!"));
}

#[test]
fn invariant_packshot_count_threshold() {
    let (_dir, pipeline) = create_pipeline();
    let packshot = |x: f64| LayoutElement::new(ElementKind::Packshot, x, 400.0);

    let report = validate(
        &pipeline,
        Canvas::new(1200, 1200),
        vec![packshot(0.0), packshot(100.0), packshot(200.0)],
    );
    assert!(report.checks[3].passed);

    let report = validate(
        &pipeline,
        Canvas::new(1200, 1200),
        vec![packshot(0.0), packshot(100.0), packshot(200.0), packshot(300.0)],
    );
    let count = &report.checks[3];
    assert!(!count.passed);
    assert!(count.details.contains("4 > 3"));
    assert!(!report.overall_pass);
}

#[test]
fn invariant_auto_fix_preserves_list_shape() {
    let (_dir, pipeline) = create_pipeline();
    let elements = vec![
        LayoutElement::new(ElementKind::Shape, 0.0, 0.0),
        text_element(100.0, 12, "High"),
        LayoutElement::new(ElementKind::Packshot, 0.0, 1900.0),
        text_element(1800.0, 50, "Low"),
    ];
    let original = elements.clone();

    let fixed = pipeline.auto_fix(&FixRequest {
        width: 1080,
        height: 1920,
        elements: elements.clone(),
    });

    assert_eq!(fixed.len(), original.len());
    for (before, after) in original.iter().zip(&fixed) {
        assert_eq!(before.kind, after.kind);
    }
    assert_eq!(elements, original);
}

#[test]
fn invariant_auto_fix_is_stable_after_one_pass() {
    let (_dir, pipeline) = create_pipeline();
    let elements = vec![text_element(100.0, 40, "High"), text_element(1800.0, 50, "Low")];

    let once = pipeline.auto_fix(&FixRequest {
        width: 1080,
        height: 1920,
        elements,
    });
    let twice = pipeline.auto_fix(&FixRequest {
        width: 1080,
        height: 1920,
        elements: once.clone(),
    });
    assert_eq!(once, twice);
}

#[test]
fn invariant_fixed_layout_passes_revalidation() {
    let (_dir, pipeline) = create_pipeline();
    let elements = vec![text_element(100.0, 12, "High"), text_element(1800.0, 50, "Low")];

    let fixed = pipeline.auto_fix(&FixRequest {
        width: 1080,
        height: 1920,
        elements,
    });
    let report = validate(&pipeline, Canvas::new(1080, 1920), fixed);
    assert!(report.overall_pass);
}

#[test]
fn invariant_blank_export_fits_budget_without_quality_loss() {
    let (_dir, pipeline) = create_pipeline();
    let artifact = pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(1200, 1200),
            elements: vec![],
        })
        .unwrap();

    assert!(artifact.size_kb <= 500.0);
    assert_eq!(artifact.quality, 95);
    assert!(artifact.url.starts_with("/exports/"));
    let path = pipeline.store().exports_dir().join(&artifact.filename);
    assert!(path.is_file());
}

#[test]
fn invariant_export_writes_exactly_one_file() {
    let (_dir, pipeline) = create_pipeline();
    pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(800, 800),
            elements: vec![],
        })
        .unwrap();

    let exported: Vec<_> = std::fs::read_dir(pipeline.store().exports_dir())
        .unwrap()
        .collect();
    assert_eq!(exported.len(), 1);
}

#[test]
fn invariant_identical_input_yields_identical_bytes() {
    let (_dir, pipeline) = create_pipeline();
    let request = ExportRequest {
        canvas: Canvas::new(600, 600),
        elements: vec![],
    };

    let first = pipeline.export(&request).unwrap();
    let second = pipeline.export(&request).unwrap();
    assert_eq!(first.content_hash, second.content_hash);
    assert_ne!(first.filename, second.filename);
}

#[test]
fn invariant_bad_background_color_falls_back_to_white() {
    let (_dir, pipeline) = create_pipeline();

    let mut canvas = Canvas::new(600, 600);
    canvas.background_color = "definitely-not-a-color".to_string();
    let degraded = pipeline
        .export(&ExportRequest {
            canvas,
            elements: vec![],
        })
        .unwrap();

    let white = pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(600, 600),
            elements: vec![],
        })
        .unwrap();

    assert_eq!(degraded.content_hash, white.content_hash);
}

#[test]
fn invariant_per_element_failures_do_not_abort_export() {
    let (_dir, pipeline) = create_pipeline();

    let mut missing_asset = LayoutElement::new(ElementKind::Packshot, 100.0, 100.0);
    missing_asset.width = 300.0;
    missing_asset.height = 300.0;
    missing_asset.text = Some("never-uploaded.png".to_string());

    let mut shape = LayoutElement::new(ElementKind::Shape, 0.0, 0.0);
    shape.width = 600.0;
    shape.height = 100.0;
    shape.color = Some("#f0f0f0".to_string());

    let artifact = pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(1200, 1200),
            elements: vec![shape, missing_asset, text_element(600.0, 48, "Headline")],
        })
        .unwrap();
    assert!(artifact.size_kb > 0.0);
}

#[test]
fn invariant_stored_asset_composites_into_export() {
    use image::codecs::png::PngEncoder;

    let (_dir, pipeline) = create_pipeline();

    // A small red square with transparency, PNG-encoded.
    let tile = image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 0, 0, 128]));
    let mut png = Vec::new();
    tile.write_with_encoder(PngEncoder::new(&mut png)).unwrap();
    let stored = pipeline.store_upload(&png, "tile.png").unwrap();

    let mut el = LayoutElement::new(ElementKind::Image, 200.0, 200.0);
    el.width = 128.0;
    el.height = 128.0;
    el.text = Some(stored.url.clone());

    let artifact = pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(600, 600),
            elements: vec![el],
        })
        .unwrap();

    // Compositing a visible asset must change the output bytes.
    let blank = pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(600, 600),
            elements: vec![],
        })
        .unwrap();
    assert_ne!(artifact.content_hash, blank.content_hash);
}

#[test]
fn invariant_zero_dimension_canvas_is_fatal() {
    let (_dir, pipeline) = create_pipeline();
    let result = pipeline.export(&ExportRequest {
        canvas: Canvas::new(0, 600),
        elements: vec![],
    });

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("not renderable"));
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_budget_search_records_encode_attempts() {
    use creativeos_core::render::get_encode_attempts;

    let (_dir, pipeline) = create_pipeline();
    // The counter is cumulative across concurrently running tests, so
    // only the lower bound is asserted here.
    let before = get_encode_attempts();
    pipeline
        .export(&ExportRequest {
            canvas: Canvas::new(400, 400),
            elements: vec![],
        })
        .unwrap();
    assert!(get_encode_attempts() > before);
}
