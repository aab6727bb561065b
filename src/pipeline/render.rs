//! Document rendering: parsed recipe text → styled `.docx`.
//!
//! Every document uses the same three paragraph styles so that a whole
//! cookbook prints uniformly:
//!
//! | Style          | Font             | Size  | Weight |
//! |----------------|------------------|-------|--------|
//! | `TitleStyle`   | Times New Roman  | 16 pt | bold   |
//! | `HeadingStyle` | Times New Roman  | 14 pt | bold   |
//! | `BodyStyle`    | Times New Roman  | 12 pt | normal |
//!
//! The paragraph sequence is built first as a plain [`RecipeDocument`] and
//! only turned into a `docx_rs::Docx` at save time, which keeps the layout
//! testable without unpacking a zip.

use crate::config::PipelineConfig;
use crate::error::{ItemError, RecipeScanError};
use crate::output::{Stage, StageRecorder, StageReport};
use crate::pipeline::input::{display_name, ensure_dir, list_files};
use crate::recipe::Recipe;
use docx_rs::{Docx, Paragraph, Run, RunFonts, Style, StyleType};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FONT_FAMILY: &str = "Times New Roman";

/// The three paragraph styles of a recipe document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Title,
    Heading,
    Body,
}

impl ParagraphStyle {
    pub const ALL: [ParagraphStyle; 3] = [Self::Title, Self::Heading, Self::Body];

    pub fn style_id(self) -> &'static str {
        match self {
            Self::Title => "TitleStyle",
            Self::Heading => "HeadingStyle",
            Self::Body => "BodyStyle",
        }
    }

    /// Font size in points.
    pub fn points(self) -> usize {
        match self {
            Self::Title => 16,
            Self::Heading => 14,
            Self::Body => 12,
        }
    }

    pub fn is_bold(self) -> bool {
        !matches!(self, Self::Body)
    }

    fn to_style(self) -> Style {
        let fonts = RunFonts::new()
            .ascii(FONT_FAMILY)
            .hi_ansi(FONT_FAMILY)
            .east_asia(FONT_FAMILY)
            .cs(FONT_FAMILY);
        // docx sizes are in half-points.
        let style = Style::new(self.style_id(), StyleType::Paragraph)
            .name(self.style_id())
            .size(self.points() * 2)
            .fonts(fonts);
        if self.is_bold() {
            style.bold()
        } else {
            style
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledParagraph {
    pub style: ParagraphStyle,
    pub text: String,
}

/// A recipe laid out as an ordered list of styled paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDocument {
    paragraphs: Vec<StyledParagraph>,
}

impl RecipeDocument {
    /// Title, `Ingredients` heading, one paragraph per ingredient, `Method`
    /// heading, one paragraph per step.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let mut paragraphs = Vec::with_capacity(3 + recipe.ingredients.len() + recipe.method.len());
        let mut push = |style, text: &str| {
            paragraphs.push(StyledParagraph {
                style,
                text: text.to_string(),
            })
        };

        push(ParagraphStyle::Title, &recipe.name);
        push(ParagraphStyle::Heading, "Ingredients");
        for ingredient in &recipe.ingredients {
            push(ParagraphStyle::Body, ingredient);
        }
        push(ParagraphStyle::Heading, "Method");
        for step in &recipe.method {
            push(ParagraphStyle::Body, step);
        }

        Self { paragraphs }
    }

    pub fn paragraphs(&self) -> &[StyledParagraph] {
        &self.paragraphs
    }

    pub fn to_docx(&self) -> Docx {
        let docx = ParagraphStyle::ALL
            .iter()
            .fold(Docx::new(), |docx, style| docx.add_style(style.to_style()));

        self.paragraphs.iter().fold(docx, |docx, p| {
            docx.add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(&p.text))
                    .style(p.style.style_id()),
            )
        })
    }

    /// Packed `.docx` bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ItemError> {
        let mut buf = Vec::new();
        self.to_docx()
            .build()
            .pack(Cursor::new(&mut buf))
            .map_err(|e| ItemError::Document {
                detail: e.to_string(),
            })?;
        Ok(buf)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ItemError> {
        let bytes = self.to_bytes()?;
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| ItemError::Write {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
    }
}

/// Render every parsed recipe in `parsed/` into `export/docx/`.
///
/// Creates `export/`, `export/docx/` and `export/pdf/` whether or not any
/// recipe renders.
pub async fn export_documents(config: &PipelineConfig) -> Result<StageReport, RecipeScanError> {
    let layout = &config.layout;
    for dir in [layout.export_dir(), layout.docx_dir(), layout.pdf_dir()] {
        ensure_dir(&dir).await?;
    }

    let files = list_files(&layout.parsed_dir(), Some("txt")).await?;
    let docx_dir = layout.docx_dir();
    let mut recorder = StageRecorder::start(Stage::Render, config.progress_callback.as_ref(), files.len());

    for path in files {
        let name = display_name(&path);
        recorder.item_started(&name);
        info!("Processing {}", name);

        match render_one(&path, &docx_dir).await {
            Ok(out) => recorder.succeeded(name, vec![out]),
            Err(e) => recorder.failed(name, e),
        }
    }

    Ok(recorder.finish())
}

async fn render_one(parsed: &Path, docx_dir: &Path) -> Result<PathBuf, ItemError> {
    let text = tokio::fs::read_to_string(parsed)
        .await
        .map_err(|e| ItemError::Read {
            path: parsed.to_path_buf(),
            detail: e.to_string(),
        })?;

    let recipe = Recipe::from_parsed_text(&text)?;
    let doc = RecipeDocument::from_recipe(&recipe);
    debug!("{}: {} paragraph(s)", recipe.name, doc.paragraphs().len());

    let out = docx_dir.join(recipe.docx_file_name());
    doc.save(&out).await?;
    info!("Document saved as {}", out.display());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::io::Read;
    use tempfile::TempDir;

    fn pancakes() -> Recipe {
        Recipe::new("Pancakes", ["2 eggs", "1 cup milk"], ["Whisk", "Fry"])
    }

    #[test]
    fn paragraph_order_and_styles() {
        let doc = RecipeDocument::from_recipe(&pancakes());
        let seq: Vec<(ParagraphStyle, &str)> = doc
            .paragraphs()
            .iter()
            .map(|p| (p.style, p.text.as_str()))
            .collect();
        assert_eq!(
            seq,
            vec![
                (ParagraphStyle::Title, "Pancakes"),
                (ParagraphStyle::Heading, "Ingredients"),
                (ParagraphStyle::Body, "2 eggs"),
                (ParagraphStyle::Body, "1 cup milk"),
                (ParagraphStyle::Heading, "Method"),
                (ParagraphStyle::Body, "Whisk"),
                (ParagraphStyle::Body, "Fry"),
            ]
        );
    }

    #[test]
    fn empty_sections_still_have_headings() {
        let doc = RecipeDocument::from_recipe(&Recipe::new("Air", Vec::<String>::new(), Vec::<String>::new()));
        let styles: Vec<ParagraphStyle> = doc.paragraphs().iter().map(|p| p.style).collect();
        assert_eq!(
            styles,
            vec![ParagraphStyle::Title, ParagraphStyle::Heading, ParagraphStyle::Heading]
        );
    }

    #[test]
    fn style_table() {
        assert_eq!(ParagraphStyle::Title.points(), 16);
        assert_eq!(ParagraphStyle::Heading.points(), 14);
        assert_eq!(ParagraphStyle::Body.points(), 12);
        assert!(ParagraphStyle::Heading.is_bold());
        assert!(!ParagraphStyle::Body.is_bold());
    }

    // ── Reading packed documents back ────────────────────────────────────

    fn xml_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    /// `(style id, text)` of every body paragraph, in document order.
    fn written_paragraphs(bytes: &[u8]) -> Vec<(String, String)> {
        let paragraph = Regex::new(r"(?s)<w:p[ >].*?</w:p>").unwrap();
        let style = Regex::new(r#"<w:pStyle w:val="([^"]*)""#).unwrap();
        let text = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").unwrap();

        let xml = xml_part(bytes, "word/document.xml");
        paragraph
            .find_iter(&xml)
            .map(|p| {
                let p = p.as_str();
                let id = style.captures(p).map(|c| c[1].to_string()).unwrap_or_default();
                let body: String = text.captures_iter(p).map(|c| c[1].to_string()).collect();
                (id, body)
            })
            .collect()
    }

    /// The `<w:style>` element for `id` in `word/styles.xml`.
    fn written_style(bytes: &[u8], id: &str) -> String {
        let xml = xml_part(bytes, "word/styles.xml");
        let re = Regex::new(&format!(r#"(?s)<w:style\b[^>]*w:styleId="{id}"[^>]*>.*?</w:style>"#)).unwrap();
        re.find(&xml)
            .unwrap_or_else(|| panic!("no style {id} in styles.xml"))
            .as_str()
            .to_string()
    }

    #[test]
    fn packed_document_reads_back_in_order() {
        let bytes = RecipeDocument::from_recipe(&pancakes()).to_bytes().unwrap();
        assert!(bytes.starts_with(b"PK"));

        let expected: Vec<(String, String)> = [
            ("TitleStyle", "Pancakes"),
            ("HeadingStyle", "Ingredients"),
            ("BodyStyle", "2 eggs"),
            ("BodyStyle", "1 cup milk"),
            ("HeadingStyle", "Method"),
            ("BodyStyle", "Whisk"),
            ("BodyStyle", "Fry"),
        ]
        .iter()
        .map(|(s, t)| (s.to_string(), t.to_string()))
        .collect();
        assert_eq!(written_paragraphs(&bytes), expected);
    }

    #[test]
    fn packed_styles_carry_font_size_and_weight() {
        let bytes = RecipeDocument::from_recipe(&pancakes()).to_bytes().unwrap();
        let size = Regex::new(r#"<w:sz w:val="(\d+)""#).unwrap();
        let bold = Regex::new(r"<w:b\b").unwrap();

        for (id, half_points, is_bold) in [
            ("TitleStyle", "32", true),
            ("HeadingStyle", "28", true),
            ("BodyStyle", "24", false),
        ] {
            let style = written_style(&bytes, id);
            assert_eq!(&size.captures(&style).unwrap()[1], half_points, "{id}: {style}");
            assert_eq!(bold.is_match(&style), is_bold, "{id}: {style}");
            assert!(style.contains(r#"w:ascii="Times New Roman""#), "{id}: {style}");
        }
    }

    #[tokio::test]
    async fn export_skips_recipe_without_method() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder().root(root.path()).build().unwrap();
        let parsed = config.layout.parsed_dir();
        std::fs::create_dir_all(&parsed).unwrap();
        std::fs::write(parsed.join("Good_parsed.txt"), pancakes().to_parsed_text()).unwrap();
        std::fs::write(parsed.join("Bad_parsed.txt"), "Recipe: Bad\n\nIngredients:\nx\n").unwrap();

        let report = export_documents(&config).await.unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.errors().next(),
            Some(&ItemError::MissingHeading {
                heading: "Method:".into()
            })
        );

        assert!(config.layout.docx_dir().join("Pancakes.docx").is_file());
        assert!(config.layout.pdf_dir().is_dir());
        let docs = std::fs::read_dir(config.layout.docx_dir()).unwrap().count();
        assert_eq!(docs, 1);
    }

    #[tokio::test]
    async fn export_skips_recipe_with_blank_name() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder().root(root.path()).build().unwrap();
        let parsed = config.layout.parsed_dir();
        std::fs::create_dir_all(&parsed).unwrap();
        std::fs::write(
            parsed.join("Empty_parsed.txt"),
            "Recipe: \n\nIngredients:\nx\n\nMethod:\ny\n",
        )
        .unwrap();

        let report = export_documents(&config).await.unwrap();
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.errors().next(),
            Some(&ItemError::EmptyField {
                field: "Recipe".into()
            })
        );
        assert_eq!(std::fs::read_dir(config.layout.docx_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn export_without_parsed_dir_is_fatal() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder().root(root.path()).build().unwrap();
        let err = export_documents(&config).await.unwrap_err();
        assert!(matches!(err, RecipeScanError::DirectoryRead { .. }));
    }
}
