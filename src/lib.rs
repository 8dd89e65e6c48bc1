//! CreativeOS Core - Layout Compliance & Rendering Engine
//!
//! # Ground Rules
//! 1. Validation Reports, Never Rejects
//! 2. Auto-Fix Moves Geometry, Not Meaning
//! 3. Exports Degrade Gracefully
//! 4. Every Artifact Gets A Fresh Name
//! 5. The Size Budget Is A Search, Not A Guess

pub mod assets;
pub mod autofix;
pub mod compliance;
pub mod elements;
pub mod pipeline;
pub mod proposals;
pub mod render;

pub use assets::{AssetStore, BackgroundRemoval, StoredAsset};
pub use autofix::auto_fix_elements;
pub use compliance::{ComplianceCheck, ComplianceRule, ValidationReport, Validator};
pub use elements::{Canvas, ElementKind, LayoutElement, TileType};
pub use pipeline::{
    CreativePipeline, ExportRequest, FixRequest, ProposalRequest, ValidateRequest,
};
pub use proposals::{suggest_layouts, LayoutProposal};
pub use render::{ExportArtifact, ExportError, ExportRenderer};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
