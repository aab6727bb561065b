//! Stage reports: what each stage produced and what it dropped.

use crate::error::ItemError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

/// One of the processing phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// External bitmap cleanup.
    Normalize,
    /// OCR into `scanned/`.
    Extract,
    /// Completion API into `parsed/`.
    Split,
    /// Parsed recipe into `export/docx/`.
    Render,
    /// DOCX into `export/pdf/`.
    Convert,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalize => "normalize",
            Stage::Extract => "extract",
            Stage::Split => "split",
            Stage::Render => "render",
            Stage::Convert => "convert",
        };
        f.write_str(name)
    }
}

/// Outcome of one item within a stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    /// File name, or `file#block` for recipe blocks.
    pub item: String,
    /// Files written for this item.
    pub outputs: Vec<PathBuf>,
    /// `Some` if the item was dropped.
    pub error: Option<ItemError>,
}

/// Everything a stage did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub items: Vec<ItemResult>,
    pub duration_ms: u64,
}

impl StageReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.error.is_some()).count()
    }

    /// All files written by the stage, in processing order.
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.items
            .iter()
            .flat_map(|i| i.outputs.iter().cloned())
            .collect()
    }

    /// Errors of the dropped items.
    pub fn errors(&self) -> impl Iterator<Item = &ItemError> {
        self.items.iter().filter_map(|i| i.error.as_ref())
    }
}

/// Collects item results for a stage and forwards them to the progress
/// callback and the log.
pub(crate) struct StageRecorder<'a> {
    stage: Stage,
    callback: Option<&'a ProgressCallback>,
    items: Vec<ItemResult>,
    started: Instant,
}

impl<'a> StageRecorder<'a> {
    pub(crate) fn start(stage: Stage, callback: Option<&'a ProgressCallback>, total: usize) -> Self {
        info!("[{}] starting: {} item(s)", stage, total);
        if let Some(cb) = callback {
            cb.on_stage_start(stage, total);
        }
        Self {
            stage,
            callback,
            items: Vec::with_capacity(total),
            started: Instant::now(),
        }
    }

    pub(crate) fn item_started(&self, item: &str) {
        if let Some(cb) = self.callback {
            cb.on_item_start(self.stage, item);
        }
    }

    pub(crate) fn succeeded(&mut self, item: impl Into<String>, outputs: Vec<PathBuf>) {
        let item = item.into();
        info!("[{}] OK {}", self.stage, item);
        if let Some(cb) = self.callback {
            cb.on_item_complete(self.stage, &item);
        }
        self.items.push(ItemResult {
            item,
            outputs,
            error: None,
        });
    }

    pub(crate) fn failed(&mut self, item: impl Into<String>, err: ItemError) {
        let item = item.into();
        error!("[{}] {} dropped: {}", self.stage, item, err);
        if let Some(cb) = self.callback {
            cb.on_item_error(self.stage, &item, &err.to_string());
        }
        self.items.push(ItemResult {
            item,
            outputs: Vec::new(),
            error: Some(err),
        });
    }

    pub(crate) fn finish(self) -> StageReport {
        let report = StageReport {
            stage: self.stage,
            items: self.items,
            duration_ms: self.started.elapsed().as_millis() as u64,
        };
        info!(
            "[{}] finished: {}/{} ok in {}ms",
            report.stage,
            report.succeeded(),
            report.items.len(),
            report.duration_ms
        );
        if let Some(cb) = self.callback {
            cb.on_stage_complete(report.stage, report.items.len(), report.succeeded());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_display_is_lowercase() {
        assert_eq!(Stage::Normalize.to_string(), "normalize");
        assert_eq!(Stage::Convert.to_string(), "convert");
    }

    #[test]
    fn recorder_counts_successes_and_failures() {
        let mut rec = StageRecorder::start(Stage::Render, None, 2);
        rec.succeeded("Soup_parsed.txt", vec![PathBuf::from("export/docx/Soup.docx")]);
        rec.failed(
            "Broken_parsed.txt",
            ItemError::MissingHeading {
                heading: "Method:".into(),
            },
        );
        let report = rec.finish();

        assert_eq!(report.stage, Stage::Render);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outputs(), vec![PathBuf::from("export/docx/Soup.docx")]);
        assert_eq!(report.errors().count(), 1);
    }

    #[test]
    fn report_serialises_stage_lowercase() {
        let report = StageRecorder::start(Stage::Split, None, 0).finish();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"stage\":\"split\""), "got: {json}");
    }
}
