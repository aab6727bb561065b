//! PDF conversion: a second pass over `export/docx/` through an external
//! office suite.
//!
//! Unlike the other stages, conversion is all-or-nothing from the first
//! failure onward: the error is returned and the remaining documents are not
//! attempted. PDFs written before the failure stay on disk.

use crate::config::PipelineConfig;
use crate::error::RecipeScanError;
use crate::output::{Stage, StageRecorder, StageReport};
use crate::pipeline::input::{display_name, ensure_dir, list_files};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Converts one `.docx` into a PDF inside `pdf_dir`.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Path of the written PDF.
    async fn convert(&self, docx: &Path, pdf_dir: &Path) -> Result<PathBuf, RecipeScanError>;
}

/// `<program> --headless --convert-to pdf --outdir <pdf_dir> <docx>`.
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: String,
}

impl SofficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.converter.clone())
    }
}

#[async_trait]
impl PdfConverter for SofficeConverter {
    async fn convert(&self, docx: &Path, pdf_dir: &Path) -> Result<PathBuf, RecipeScanError> {
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(pdf_dir)
            .arg(docx)
            .output()
            .await
            .map_err(|source| RecipeScanError::ToolSpawn {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RecipeScanError::ToolFailed {
                tool: self.program.clone(),
                path: docx.to_path_buf(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(pdf_path_for(docx, pdf_dir))
    }
}

/// `<pdf_dir>/<docx stem>.pdf`
pub fn pdf_path_for(docx: &Path, pdf_dir: &Path) -> PathBuf {
    let stem = docx
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    pdf_dir.join(format!("{stem}.pdf"))
}

/// Convert every `.docx` in `export/docx/`, stopping at the first failure.
pub async fn convert_documents(
    config: &PipelineConfig,
    converter: &dyn PdfConverter,
) -> Result<StageReport, RecipeScanError> {
    let docs = list_files(&config.layout.docx_dir(), Some("docx")).await?;
    let pdf_dir = config.layout.pdf_dir();
    ensure_dir(&pdf_dir).await?;

    let mut recorder = StageRecorder::start(Stage::Convert, config.progress_callback.as_ref(), docs.len());

    for docx in docs {
        let name = display_name(&docx);
        recorder.item_started(&name);
        info!("Converting {}", name);

        let pdf = converter.convert(&docx, &pdf_dir).await?;
        recorder.succeeded(name, vec![pdf]);
    }

    Ok(recorder.finish())
}
