//! Configuration types for the recipe pipeline.
//!
//! Every stage receives the same [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Folder names, tool commands and the completion
//! endpoint all live here instead of being scattered through the stages, so
//! two runs can be compared by diffing their configs.

use crate::error::RecipeScanError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default completion endpoint (any OpenAI-compatible chat API works).
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model identifier sent in the request body.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Token budget for a single recipe response.
pub const DEFAULT_MAX_TOKENS: usize = 10_000;

/// Folder layout shared by all stages.
///
/// Each folder is relative to `root`; `export` holds the `docx/` and `pdf/`
/// sub-folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub root: PathBuf,
    pub images: PathBuf,
    pub scanned: PathBuf,
    pub parsed: PathBuf,
    pub export: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Layout {
    /// Standard layout (`images/`, `scanned/`, `parsed/`, `export/`) under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            images: PathBuf::from("images"),
            scanned: PathBuf::from("scanned"),
            parsed: PathBuf::from("parsed"),
            export: PathBuf::from("export"),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(&self.images)
    }

    pub fn scanned_dir(&self) -> PathBuf {
        self.root.join(&self.scanned)
    }

    pub fn parsed_dir(&self) -> PathBuf {
        self.root.join(&self.parsed)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(&self.export)
    }

    pub fn docx_dir(&self) -> PathBuf {
        self.export_dir().join("docx")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.export_dir().join("pdf")
    }
}

/// Configuration for a pipeline run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use recipescan::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .root("/tmp/recipes")
///     .model("gpt-4.1-mini")
///     .max_tokens(4000)
///     .build()
///     .unwrap();
/// assert!(config.layout.parsed_dir().ends_with("parsed"));
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Where every stage reads and writes.
    pub layout: Layout,

    /// Bitmap-cleanup command prefix. Default: `python3 noteshrink.py`.
    ///
    /// The input path, `-b` and the output base path are appended per image.
    pub normalizer: Vec<String>,

    /// OCR program. Default: `tesseract`.
    pub tesseract: String,

    /// OCR language. Default: `eng`.
    pub ocr_language: String,

    /// Document-to-PDF converter program. Default: `soffice`.
    pub converter: String,

    /// Chat-completions URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Bearer credential for [`Self::endpoint`]. Sent only when present.
    pub api_key: Option<String>,

    /// Model identifier sent to the completion API. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Maximum tokens per completion. Default: [`DEFAULT_MAX_TOKENS`].
    pub max_tokens: usize,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// When set, requests go through `edgequake-llm` instead of [`Self::endpoint`].
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom system message. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            normalizer: vec!["python3".to_string(), "noteshrink.py".to_string()],
            tesseract: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            converter: "soffice".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            provider_name: None,
            provider: None,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("layout", &self.layout)
            .field("normalizer", &self.normalizer)
            .field("tesseract", &self.tesseract)
            .field("ocr_language", &self.ocr_language)
            .field("converter", &self.converter)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Re-root the standard layout, keeping the folder names.
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.config.layout.root = root.as_ref().to_path_buf();
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Bitmap-cleanup command, split on whitespace (`"python3 noteshrink.py"`).
    pub fn normalizer(mut self, command: &str) -> Self {
        self.config.normalizer = command.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn tesseract(mut self, program: impl Into<String>) -> Self {
        self.config.tesseract = program.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn converter(mut self, program: impl Into<String>) -> Self {
        self.config.converter = program.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, RecipeScanError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(RecipeScanError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if !c.endpoint.starts_with("http://") && !c.endpoint.starts_with("https://") {
            return Err(RecipeScanError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.normalizer.is_empty() {
            return Err(RecipeScanError::InvalidConfig(
                "normalizer command is empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_matches_folder_contract() {
        let layout = Layout::new("/work");
        assert_eq!(layout.images_dir(), PathBuf::from("/work/images"));
        assert_eq!(layout.scanned_dir(), PathBuf::from("/work/scanned"));
        assert_eq!(layout.parsed_dir(), PathBuf::from("/work/parsed"));
        assert_eq!(layout.docx_dir(), PathBuf::from("/work/export/docx"));
        assert_eq!(layout.pdf_dir(), PathBuf::from("/work/export/pdf"));
    }

    #[test]
    fn builder_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 10_000);
        assert_eq!(config.normalizer, vec!["python3", "noteshrink.py"]);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = PipelineConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, RecipeScanError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = PipelineConfig::builder()
            .endpoint("ftp://example.org")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.org"));
    }

    #[test]
    fn builder_rejects_blank_normalizer() {
        assert!(PipelineConfig::builder().normalizer("   ").build().is_err());
    }

    #[test]
    fn empty_api_key_is_treated_as_absent() {
        let config = PipelineConfig::builder().api_key("").build().unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = PipelineConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
