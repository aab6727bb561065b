//! # recipescan
//!
//! Turn photographed recipe pages into tidy, uniformly styled recipe
//! documents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images/            photographed pages
//!  │
//!  ├─ 1. Normalize   external bitmap cleanup (noteshrink) beside each original
//!  ├─ 2. Extract     grayscale + OCR, appended to scanned/<stem>_output.txt
//!  ├─ 3. Split       one completion call per `==========` block → parsed/*.txt
//!  ├─ 4. Render      parsed recipe → export/docx/<Name>.docx
//!  └─ 5. Convert     export/docx/*.docx → export/pdf/*.pdf (external converter)
//! ```
//!
//! Stages only talk to each other through the file system, so each one can
//! be run on its own (`recipescan reader`, `recipescan parser`,
//! `recipescan export`) or all together (`recipescan run`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use recipescan::{run_all, PipelineConfig, Toolchain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .root("./my-recipes")
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!     let tools = Toolchain::from_config(&config)?;
//!     for report in run_all(&config, &tools).await? {
//!         eprintln!("{}: {}/{} ok", report.stage, report.succeeded(), report.items.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `recipescan` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod driver;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod recipe;
pub mod stages;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Layout, PipelineConfig, PipelineConfigBuilder};
pub use error::{ItemError, RecipeScanError};
pub use output::{ItemResult, Stage, StageReport};
pub use pipeline::complete::{Completer, HttpCompleter, ProviderCompleter};
pub use pipeline::extract::{OcrEngine, TesseractEngine};
pub use pipeline::normalize::{CommandCleaner, ImageCleaner};
pub use pipeline::pdf::{PdfConverter, SofficeConverter};
pub use pipeline::render::RecipeDocument;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use recipe::Recipe;
pub use stages::{run_all, run_export, run_parser, run_reader, Toolchain};
