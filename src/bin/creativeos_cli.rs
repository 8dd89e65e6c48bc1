//! CreativeOS CLI - Bridge interface for the transport layer
//!
//! Commands: propose, validate, autofix, export, store, remove-bg
//! Outputs JSON to stdout
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use base64::Engine as _;
use creativeos_core::{
    pipeline::CreativePipeline,
    AssetStore, ExportRequest, FixRequest, ProposalRequest, ValidateRequest,
};

#[derive(Parser)]
#[command(name = "creativeos-cli")]
#[command(about = "CreativeOS CLI - Layout Compliance & Rendering Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding uploaded packshots
    #[arg(long, default_value = "uploads")]
    uploads_dir: PathBuf,

    /// Directory exported creatives are written to
    #[arg(long, default_value = "exports")]
    exports_dir: PathBuf,

    /// Optional directory of .ttf files, looked up by family name
    #[arg(long)]
    fonts_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate starting layouts for a packshot
    Propose {
        /// JSON payload (ProposalRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Run the compliance battery over a layout
    Validate {
        /// JSON payload (ValidateRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Apply geometry corrections to a layout
    Autofix {
        /// JSON payload (FixRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Composite and persist a creative
    Export {
        /// JSON payload (ExportRequest)
        #[arg(short, long)]
        payload: String,
    },

    /// Store an uploaded image
    Store {
        /// Original filename, used for the extension
        #[arg(short, long)]
        name: String,

        /// Base64-encoded image bytes
        #[arg(short, long)]
        payload: String,
    },

    /// Request a transparent cutout for an upload
    RemoveBg {
        /// Upload reference
        #[arg(short, long)]
        reference: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let store = AssetStore::new(cli.uploads_dir, cli.exports_dir);
    let pipeline = CreativePipeline::new(store, cli.fonts_dir);

    match cli.command {
        Commands::Propose { payload } => {
            let request: ProposalRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let proposals = pipeline.propose(&request);
            println!("{}", serde_json::to_string_pretty(&proposals).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Validate { payload } => {
            let request: ValidateRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!(r#"{{"overall_pass": false, "error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let report = pipeline.validate(&request);
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
            if report.overall_pass {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            }
        }

        Commands::Autofix { payload } => {
            let request: FixRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!(r#"{{"error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let fixed = pipeline.auto_fix(&request);
            println!("{}", serde_json::to_string_pretty(&fixed).unwrap());
            ExitCode::SUCCESS
        }

        Commands::Export { payload } => {
            let request: ExportRequest = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    println!(r#"{{"success": false, "error": "Invalid payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            match pipeline.export(&request) {
                Ok(artifact) => {
                    let output = serde_json::json!({
                        "success": true,
                        "artifact": artifact,
                    });
                    println!("{}", serde_json::to_string_pretty(&output).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string(&output).unwrap());
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Store { name, payload } => {
            let contents = match base64::engine::general_purpose::STANDARD.decode(&payload) {
                Ok(bytes) => bytes,
                Err(e) => {
                    println!(r#"{{"error": "Invalid base64 payload: {}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            match pipeline.store_upload(&contents, &name) {
                Ok(stored) => {
                    println!("{}", serde_json::to_string_pretty(&stored).unwrap());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!(r#"{{"error": "Failed to store upload: {}"}}"#, e);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::RemoveBg { reference } => {
            let outcome = pipeline.remove_background(&reference);
            println!("{}", serde_json::to_string_pretty(&outcome).unwrap());
            ExitCode::SUCCESS
        }
    }
}
