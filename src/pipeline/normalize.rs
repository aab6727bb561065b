//! Image normalisation: run the external bitmap-cleanup tool per photo.
//!
//! The default tool is `noteshrink.py`, which flattens the paper background
//! and saturates ink, invoked as
//!
//! ```text
//! python3 noteshrink.py images/page1.jpg -b images/page1
//! ```
//!
//! so the cleaned bitmap (`images/page1*.png`) lands beside the original.
//! A tool that runs but exits non-zero is logged and the batch continues;
//! a tool that cannot be started at all aborts the stage.

use crate::config::PipelineConfig;
use crate::error::{ItemError, RecipeScanError};
use crate::output::{Stage, StageRecorder, StageReport};
use crate::pipeline::input::{display_name, list_files};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

/// Cleans one photographed page.
#[async_trait]
pub trait ImageCleaner: Send + Sync {
    /// Clean `input`; the tool derives its output file(s) from `output_base`.
    ///
    /// Returns [`RecipeScanError::ToolFailed`] when the tool ran and failed,
    /// [`RecipeScanError::ToolSpawn`] when it could not be started.
    async fn clean(&self, input: &Path, output_base: &Path) -> Result<(), RecipeScanError>;
}

/// Runs a command prefix such as `python3 noteshrink.py`.
#[derive(Debug, Clone)]
pub struct CommandCleaner {
    command: Vec<String>,
}

impl CommandCleaner {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.normalizer.clone())
    }

    /// The full argument vector for one image.
    pub fn command_line(&self, input: &Path, output_base: &Path) -> Vec<String> {
        let mut args = self.command.clone();
        args.push(input.to_string_lossy().into_owned());
        args.push("-b".to_string());
        args.push(output_base.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl ImageCleaner for CommandCleaner {
    async fn clean(&self, input: &Path, output_base: &Path) -> Result<(), RecipeScanError> {
        let args = self.command_line(input, output_base);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| RecipeScanError::InvalidConfig("normalizer command is empty".into()))?;

        let status = Command::new(program)
            .args(rest)
            .status()
            .await
            .map_err(|source| RecipeScanError::ToolSpawn {
                tool: program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(RecipeScanError::ToolFailed {
                tool: program.clone(),
                path: input.to_path_buf(),
                status: status.to_string(),
                stderr: String::new(),
            })
        }
    }
}

/// Run `cleaner` over every file in `images/`.
pub async fn normalize_images(
    config: &PipelineConfig,
    cleaner: &dyn ImageCleaner,
) -> Result<StageReport, RecipeScanError> {
    let images_dir = config.layout.images_dir();
    let files = list_files(&images_dir, None).await?;
    let mut recorder = StageRecorder::start(Stage::Normalize, config.progress_callback.as_ref(), files.len());

    for path in files {
        let name = display_name(&path);
        recorder.item_started(&name);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        let output_base = images_dir.join(stem);

        info!("Cleaning {}", path.display());
        match cleaner.clean(&path, &output_base).await {
            Ok(()) => recorder.succeeded(name, vec![output_base]),
            Err(RecipeScanError::ToolFailed { path, status, .. }) => {
                warn!("Cleanup tool failed on {} ({})", path.display(), status);
                recorder.failed(name, ItemError::CleanupFailed { path, status });
            }
            Err(fatal) => return Err(fatal),
        }
    }

    Ok(recorder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn command_line_appends_brightness_option() {
        let cleaner = CommandCleaner::new(vec!["python3".into(), "noteshrink.py".into()]);
        let args = cleaner.command_line(Path::new("images/p1.jpg"), Path::new("images/p1"));
        assert_eq!(
            args,
            vec!["python3", "noteshrink.py", "images/p1.jpg", "-b", "images/p1"]
        );
    }

    struct Recording {
        calls: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ImageCleaner for Recording {
        async fn clean(&self, input: &Path, output_base: &Path) -> Result<(), RecipeScanError> {
            let name = display_name(input);
            self.calls
                .lock()
                .unwrap()
                .push((name.clone(), display_name(output_base)));
            if self.fail_on == Some(name.as_str()) {
                return Err(RecipeScanError::ToolFailed {
                    tool: "fake".into(),
                    path: input.to_path_buf(),
                    status: "exit status: 2".into(),
                    stderr: String::new(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn every_image_is_cleaned_and_failures_do_not_stop_the_batch() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder().root(root.path()).build().unwrap();
        std::fs::create_dir_all(config.layout.images_dir()).unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            std::fs::write(config.layout.images_dir().join(name), b"img").unwrap();
        }

        let cleaner = Recording {
            calls: Mutex::new(Vec::new()),
            fail_on: Some("b.jpg"),
        };
        let report = normalize_images(&config, &cleaner).await.unwrap();

        let calls = cleaner.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                ("a.jpg".to_string(), "a".to_string()),
                ("b.jpg".to_string(), "b".to_string()),
                ("c.jpg".to_string(), "c".to_string()),
            ]
        );
        assert_eq!(report.succeeded(), 2);
        assert!(matches!(
            report.items[1].error,
            Some(ItemError::CleanupFailed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_tool_aborts() {
        let root = TempDir::new().unwrap();
        let config = PipelineConfig::builder()
            .root(root.path())
            .normalizer("definitely-not-a-real-cleanup-tool-xyz")
            .build()
            .unwrap();
        std::fs::create_dir_all(config.layout.images_dir()).unwrap();
        std::fs::write(config.layout.images_dir().join("a.jpg"), b"img").unwrap();

        let cleaner = CommandCleaner::from_config(&config);
        let err = normalize_images(&config, &cleaner).await.unwrap_err();
        assert!(matches!(err, RecipeScanError::ToolSpawn { .. }));
    }
}
