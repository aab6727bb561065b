//! Stage entry points.
//!
//! The three user-facing stages group the five pipeline steps:
//!
//! | Entry point    | Steps                  | Reads      | Writes                  |
//! |----------------|------------------------|------------|-------------------------|
//! | [`run_reader`] | normalize, extract     | `images/`  | `images/`, `scanned/`   |
//! | [`run_parser`] | split                  | `scanned/` | `parsed/`               |
//! | [`run_export`] | render, convert        | `parsed/`  | `export/docx`, `export/pdf` |
//!
//! Each returns `Ok` even if individual items failed; inspect the
//! [`StageReport`]s for dropped items.

use crate::config::PipelineConfig;
use crate::error::RecipeScanError;
use crate::output::StageReport;
use crate::pipeline::complete::{build_completer, Completer};
use crate::pipeline::extract::{extract_texts, OcrEngine, TesseractEngine};
use crate::pipeline::normalize::{normalize_images, CommandCleaner, ImageCleaner};
use crate::pipeline::pdf::{convert_documents, PdfConverter, SofficeConverter};
use crate::pipeline::render::export_documents;
use crate::pipeline::split::split_recipes;
use std::sync::Arc;
use tracing::info;

/// The four external collaborators of a pipeline run.
#[derive(Clone)]
pub struct Toolchain {
    pub cleaner: Arc<dyn ImageCleaner>,
    pub ocr: Arc<dyn OcrEngine>,
    pub completer: Arc<dyn Completer>,
    pub converter: Arc<dyn PdfConverter>,
}

impl Toolchain {
    /// Real tools as configured: cleanup command, tesseract, completion
    /// client, office converter.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, RecipeScanError> {
        Ok(Self {
            cleaner: Arc::new(CommandCleaner::from_config(config)),
            ocr: Arc::new(TesseractEngine::from_config(config)),
            completer: build_completer(config)?,
            converter: Arc::new(SofficeConverter::from_config(config)),
        })
    }
}

/// Clean every image, then OCR the PNGs into `scanned/`.
pub async fn run_reader(
    config: &PipelineConfig,
    cleaner: &dyn ImageCleaner,
    engine: &dyn OcrEngine,
) -> Result<Vec<StageReport>, RecipeScanError> {
    let normalized = normalize_images(config, cleaner).await?;
    let extracted = extract_texts(config, engine).await?;
    info!(
        "Reader finished: {} cleaned, {} extracted",
        normalized.succeeded(),
        extracted.succeeded()
    );
    Ok(vec![normalized, extracted])
}

/// Split scanned text into parsed recipes.
pub async fn run_parser(
    config: &PipelineConfig,
    completer: &dyn Completer,
) -> Result<StageReport, RecipeScanError> {
    let report = split_recipes(config, completer).await?;
    info!(
        "Parser finished: {} recipe(s) parsed, {} dropped",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

/// Render parsed recipes to DOCX, then convert them to PDF.
pub async fn run_export(
    config: &PipelineConfig,
    converter: &dyn PdfConverter,
) -> Result<Vec<StageReport>, RecipeScanError> {
    let rendered = export_documents(config).await?;
    let converted = convert_documents(config, converter).await?;
    info!(
        "Export finished: {} document(s), {} PDF(s)",
        rendered.succeeded(),
        converted.succeeded()
    );
    Ok(vec![rendered, converted])
}

/// All three stages in one process.
pub async fn run_all(
    config: &PipelineConfig,
    tools: &Toolchain,
) -> Result<Vec<StageReport>, RecipeScanError> {
    let mut reports = run_reader(config, tools.cleaner.as_ref(), tools.ocr.as_ref()).await?;
    reports.push(run_parser(config, tools.completer.as_ref()).await?);
    reports.extend(run_export(config, tools.converter.as_ref()).await?);
    Ok(reports)
}
