//! Text extraction: grayscale each cleaned page and run OCR over it.
//!
//! Every `.png` in `images/` is converted to grayscale with the `image`
//! crate (on a blocking thread), written to a temporary PNG, and handed to
//! an [`OcrEngine`]. The recognised fragments are joined with single spaces
//! and appended to `scanned/<stem>_output.txt` as
//!
//! ```text
//! Text from <file name>:
//! <fragments joined by spaces>
//! ==========
//! ```
//!
//! The scanned file is opened in append mode: running the stage twice over
//! the same images leaves two entries per image.

use crate::config::PipelineConfig;
use crate::error::{ItemError, RecipeScanError};
use crate::output::{Stage, StageRecorder, StageReport};
use crate::pipeline::input::{display_name, ensure_dir, list_files};
use crate::pipeline::split::DELIMITER;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

/// Recognises text in a single grayscale PNG.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Text fragments in reading order.
    async fn recognize(&self, image: &Path) -> Result<Vec<String>, ItemError>;
}

/// `tesseract <image> stdout -l <lang> --psm 6`, one image per call.
///
/// Page-segmentation mode 6 treats the page as a single uniform block and
/// emits it line by line; each non-empty output line is one fragment.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    program: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.tesseract.clone(), config.ocr_language.clone())
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &Path) -> Result<Vec<String>, ItemError> {
        let ocr_err = |detail: String| ItemError::Ocr {
            path: image.to_path_buf(),
            detail,
        };

        let output = Command::new(&self.program)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg("6")
            .output()
            .await
            .map_err(|e| ocr_err(format!("failed to launch '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ocr_err(format!("{}: {}", output.status, stderr.trim())));
        }

        Ok(fragments(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Non-empty trimmed lines of raw OCR output.
pub fn fragments(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load `image_path`, convert to grayscale, OCR it, and join the fragments.
pub async fn read_text_from_image(
    engine: &dyn OcrEngine,
    image_path: &Path,
) -> Result<String, ItemError> {
    let path = image_path.to_path_buf();
    let gray = tokio::task::spawn_blocking(move || grayscale_copy(&path))
        .await
        .map_err(|e| ItemError::Image {
            path: image_path.to_path_buf(),
            detail: format!("grayscale task panicked: {e}"),
        })??;

    let parts = engine.recognize(gray.path()).await?;
    debug!("{}: {} fragment(s)", image_path.display(), parts.len());
    Ok(parts.join(" "))
}

/// Grayscale PNG copy of `path` in a temp file (deleted on drop).
fn grayscale_copy(path: &Path) -> Result<NamedTempFile, ItemError> {
    let image_err = |detail: String| ItemError::Image {
        path: path.to_path_buf(),
        detail,
    };

    let img = image::open(path).map_err(|e| image_err(e.to_string()))?;
    let gray = DynamicImage::ImageLuma8(img.to_luma8());

    let tmp = tempfile::Builder::new()
        .prefix("recipescan-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| image_err(e.to_string()))?;
    gray.save_with_format(tmp.path(), ImageFormat::Png)
        .map_err(|e| image_err(e.to_string()))?;
    Ok(tmp)
}

/// Append `content` and a delimiter line to `dir/file_name`, creating `dir`
/// if needed.
pub async fn write_scanned(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, ItemError> {
    let path = dir.join(file_name);
    let write_err = |detail: String| ItemError::Write {
        path: path.clone(),
        detail,
    };

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| write_err(e.to_string()))?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|e| write_err(e.to_string()))?;

    let entry = format!("{content}\n{DELIMITER}\n");
    file.write_all(entry.as_bytes())
        .await
        .map_err(|e| write_err(e.to_string()))?;
    file.flush().await.map_err(|e| write_err(e.to_string()))?;

    Ok(path)
}

/// `<stem>_output.txt` for an image.
pub fn scanned_file_name(image_path: &Path) -> String {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}_output.txt")
}

/// OCR every `.png` in `images/` into `scanned/`.
pub async fn extract_texts(
    config: &PipelineConfig,
    engine: &dyn OcrEngine,
) -> Result<StageReport, RecipeScanError> {
    let images = list_files(&config.layout.images_dir(), Some("png")).await?;
    let scanned_dir = config.layout.scanned_dir();
    ensure_dir(&scanned_dir).await?;

    let mut recorder = StageRecorder::start(Stage::Extract, config.progress_callback.as_ref(), images.len());

    for image_path in images {
        let name = display_name(&image_path);
        recorder.item_started(&name);
        info!("Reading text from {}", image_path.display());

        match extract_one(engine, &image_path, &name, &scanned_dir).await {
            Ok(path) => recorder.succeeded(name, vec![path]),
            Err(e) => recorder.failed(name, e),
        }
    }

    Ok(recorder.finish())
}

async fn extract_one(
    engine: &dyn OcrEngine,
    image_path: &Path,
    name: &str,
    scanned_dir: &Path,
) -> Result<PathBuf, ItemError> {
    let text = read_text_from_image(engine, image_path).await?;
    let content = format!("Text from {name}:\n{text}");
    write_scanned(scanned_dir, &scanned_file_name(image_path), &content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    struct FixedOcr(Vec<&'static str>);

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, image: &Path) -> Result<Vec<String>, ItemError> {
            // The engine must always be handed a decodable grayscale image.
            let img = image::open(image).map_err(|e| ItemError::Ocr {
                path: image.to_path_buf(),
                detail: e.to_string(),
            })?;
            assert!(matches!(img, DynamicImage::ImageLuma8(_)));
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    fn write_png(path: &Path) {
        RgbImage::from_pixel(8, 8, Rgb([200, 30, 30])).save(path).unwrap();
    }

    #[test]
    fn fragments_skip_blank_lines() {
        assert_eq!(fragments("  Flour \n\n Sugar\n\u{c}"), vec!["Flour", "Sugar"]);
    }

    #[test]
    fn scanned_name_uses_stem() {
        assert_eq!(scanned_file_name(Path::new("images/page1.png")), "page1_output.txt");
    }

    #[tokio::test]
    async fn fragments_are_joined_with_single_spaces() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("p.png");
        write_png(&png);

        let engine = FixedOcr(vec!["Pancakes", "2 eggs", "milk"]);
        let text = read_text_from_image(&engine, &png).await.unwrap();
        assert_eq!(text, "Pancakes 2 eggs milk");
    }

    #[tokio::test]
    async fn undecodable_image_is_an_item_error() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("p.png");
        std::fs::write(&bogus, b"not a png").unwrap();

        let engine = FixedOcr(vec!["x"]);
        let err = read_text_from_image(&engine, &bogus).await.unwrap_err();
        assert!(matches!(err, ItemError::Image { .. }));
    }

    #[tokio::test]
    async fn write_scanned_appends_entry_and_delimiter() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("scanned");

        let path = write_scanned(&out, "p_output.txt", "Text from p.png:\nhello").await.unwrap();
        write_scanned(&out, "p_output.txt", "Text from p.png:\nhello").await.unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "Text from p.png:\nhello\n==========\nText from p.png:\nhello\n==========\n"
        );
    }

    #[tokio::test]
    async fn only_png_files_are_read() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder().root(root.path()).build().unwrap();
        let images = config.layout.images_dir();
        std::fs::create_dir_all(&images).unwrap();
        write_png(&images.join("page.png"));
        std::fs::write(images.join("page.jpg"), b"jpeg bytes").unwrap();

        let report = extract_texts(&config, &FixedOcr(vec!["Soup"])).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].item, "page.png");

        let scanned = std::fs::read_to_string(config.layout.scanned_dir().join("page_output.txt")).unwrap();
        assert_eq!(scanned, "Text from page.png:\nSoup\n==========\n");
    }
}
