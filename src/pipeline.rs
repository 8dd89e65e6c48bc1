//! Creative Pipeline - Single Entry Point
//!
//! Ties the asset store, rule engine and renderer together behind the
//! boundary operations. Validation and auto-fix are an explicit two-step
//! protocol: fixing never re-validates, callers re-validate after fixing.

use std::io;
use std::path::PathBuf;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetStore, BackgroundRemoval, StoredAsset, UnavailableBackgroundRemoval};
use crate::autofix::auto_fix_elements;
use crate::compliance::{ValidationReport, Validator};
use crate::elements::{Canvas, LayoutElement};
use crate::proposals::{suggest_layouts, LayoutProposal, DEFAULT_CANVAS_SIZE};
use crate::render::{ExportArtifact, ExportError, ExportRenderer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub canvas: Canvas,
    pub elements: Vec<LayoutElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRequest {
    pub width: u32,
    pub height: u32,
    pub elements: Vec<LayoutElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub packshot_id: String,
    #[serde(default = "default_canvas_dim")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_dim")]
    pub canvas_height: u32,
}

fn default_canvas_dim() -> u32 {
    DEFAULT_CANVAS_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub canvas: Canvas,
    pub elements: Vec<LayoutElement>,
}

/// Result of a background-removal attempt. On failure the original
/// reference is handed back so callers can proceed with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundRemovalOutcome {
    pub url: String,
    pub details: Option<String>,
}

/// The pipeline - single entry point for all creative operations.
pub struct CreativePipeline {
    store: AssetStore,
    validator: Validator,
    renderer: ExportRenderer,
    remover: Box<dyn BackgroundRemoval + Send + Sync>,
}

impl CreativePipeline {
    pub fn new(store: AssetStore, fonts_dir: Option<PathBuf>) -> Self {
        Self {
            renderer: ExportRenderer::new(store.clone(), fonts_dir),
            validator: Validator::new(),
            store,
            remover: Box::new(UnavailableBackgroundRemoval),
        }
    }

    /// Wire up a real cutout service implementation.
    pub fn with_background_removal(
        mut self,
        remover: Box<dyn BackgroundRemoval + Send + Sync>,
    ) -> Self {
        self.remover = remover;
        self
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Run the compliance battery. Total function, never fails.
    pub fn validate(&self, request: &ValidateRequest) -> ValidationReport {
        self.validator.validate(&request.canvas, &request.elements)
    }

    /// Geometry-only correction pass. Callers re-validate afterwards.
    pub fn auto_fix(&self, request: &FixRequest) -> Vec<LayoutElement> {
        auto_fix_elements(&request.elements, request.width, request.height)
    }

    /// Deterministic starting layouts for an uploaded packshot.
    pub fn propose(&self, request: &ProposalRequest) -> Vec<LayoutProposal> {
        suggest_layouts(
            &request.packshot_id,
            request.canvas_width,
            request.canvas_height,
        )
    }

    /// Composite, compress and persist the creative.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        self.renderer.render(&request.canvas, &request.elements)
    }

    /// Store an uploaded packshot under a collision-free name.
    pub fn store_upload(&self, contents: &[u8], original_name: &str) -> io::Result<StoredAsset> {
        self.store.save_upload(contents, original_name)
    }

    /// Ask the cutout collaborator for a transparent version of an
    /// upload. Failure is not an error: the original reference comes
    /// back with a note.
    pub fn remove_background(&self, reference: &str) -> BackgroundRemovalOutcome {
        let Some(input) = self.store.resolve(reference) else {
            return BackgroundRemovalOutcome {
                url: format!("/uploads/{}", reference),
                details: Some("Upload not found".to_string()),
            };
        };

        let output_name = format!("nobg_{}", reference);
        let output = self.store.uploads_dir().join(&output_name);
        if self.remover.remove_background(&input, &output) {
            BackgroundRemovalOutcome {
                url: format!("/uploads/{}", output_name),
                details: None,
            }
        } else {
            warn!("background removal failed for {}", reference);
            BackgroundRemovalOutcome {
                url: format!("/uploads/{}", reference),
                details: Some("Background removal failed, returned original".to_string()),
            }
        }
    }
}
