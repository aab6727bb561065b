//! Field splitting: cut scanned files into recipe blocks and have the
//! completion API restructure each block into a parsed recipe.
//!
//! One completion call is made per non-blank block, strictly one at a time.
//! A block whose call fails, or whose answer lacks a heading, is logged and
//! dropped; nothing is written for it.

use crate::config::PipelineConfig;
use crate::error::{ItemError, RecipeScanError};
use crate::output::{Stage, StageRecorder, StageReport};
use crate::pipeline::complete::Completer;
use crate::pipeline::input::{display_name, list_files};
use crate::pipeline::{postprocess, sections};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Separator line between entries of a scanned file (exactly ten `=`).
pub const DELIMITER: &str = "==========";

/// A delimiter-bounded chunk of scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeBlock {
    /// 1-based position among all chunks of the file, blank ones included.
    pub index: usize,
    pub text: String,
}

/// Split scanned content on delimiter lines, dropping blank chunks.
///
/// Content without any delimiter line is a single block.
pub fn split_blocks(content: &str) -> Vec<RecipeBlock> {
    let mut chunks: Vec<String> = vec![String::new()];

    for line in content.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == DELIMITER {
            chunks.push(String::new());
        } else if let Some(current) = chunks.last_mut() {
            current.push_str(line);
        }
    }

    chunks
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| RecipeBlock { index: i + 1, text })
        .collect()
}

/// Send every block of every scanned file through `completer` and write the
/// resulting parsed files.
pub async fn split_recipes(
    config: &PipelineConfig,
    completer: &dyn Completer,
) -> Result<StageReport, RecipeScanError> {
    let files = list_files(&config.layout.scanned_dir(), Some("txt")).await?;
    let parsed_dir = config.layout.parsed_dir();

    // Read everything up front so the progress total is the block count.
    let mut work: Vec<(String, Result<Vec<RecipeBlock>, ItemError>)> = Vec::with_capacity(files.len());
    for path in &files {
        let name = display_name(path);
        info!("Processing {}", name);
        let blocks = tokio::fs::read_to_string(path)
            .await
            .map(|content| split_blocks(&content))
            .map_err(|e| ItemError::Read {
                path: path.clone(),
                detail: e.to_string(),
            });
        work.push((name, blocks));
    }

    let total = work
        .iter()
        .map(|(_, b)| b.as_ref().map_or(1, Vec::len))
        .sum();
    let mut recorder = StageRecorder::start(Stage::Split, config.progress_callback.as_ref(), total);

    for (file_name, blocks) in work {
        let blocks = match blocks {
            Ok(blocks) => blocks,
            Err(e) => {
                recorder.failed(file_name, e);
                continue;
            }
        };

        for block in blocks {
            let item = format!("{}#{}", file_name, block.index);
            recorder.item_started(&item);
            info!("Processing recipe {} of {}", block.index, file_name);

            match split_block(completer, &block, &parsed_dir).await {
                Ok(path) => recorder.succeeded(item, vec![path]),
                Err(e) => recorder.failed(item, e),
            }
        }
    }

    Ok(recorder.finish())
}

/// Complete, parse and persist a single block.
async fn split_block(
    completer: &dyn Completer,
    block: &RecipeBlock,
    parsed_dir: &Path,
) -> Result<PathBuf, ItemError> {
    let response = completer.complete(&block.text).await?;
    debug!("Response received: {} bytes", response.len());

    let cleaned = postprocess::clean_response(&response);
    let recipe = sections::parse_response(&cleaned)?.into_recipe()?;

    let path = parsed_dir.join(recipe.parsed_file_name());
    let write_err = |e: std::io::Error| ItemError::Write {
        path: path.clone(),
        detail: e.to_string(),
    };
    tokio::fs::create_dir_all(parsed_dir).await.map_err(write_err)?;
    tokio::fs::write(&path, recipe.to_parsed_text())
        .await
        .map_err(write_err)?;

    info!("Saved recipe '{}' to {}", recipe.name, path.display());
    Ok(path)
}
