//! Error types for the recipescan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RecipeScanError`]: **Fatal**: the stage cannot proceed at all
//!   (input directory unreadable, external tool missing, provider not
//!   configured). Returned as `Err(RecipeScanError)` from the stage entry
//!   points in [`crate::stages`].
//!
//! * [`ItemError`]: **Non-fatal**: one image, block or recipe failed (OCR
//!   glitch, API error, missing heading) but every other item is fine.
//!   Stored inside [`crate::output::ItemResult`] and logged; the item is
//!   dropped without partial output.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the recipescan library.
///
/// Item-level failures use [`ItemError`] and are stored in
/// [`crate::output::ItemResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum RecipeScanError {
    // ── File-system errors ───────────────────────────────────────────────
    /// A stage input directory could not be listed.
    #[error("Failed to read directory '{path}': {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output directory could not be created.
    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── External tool errors ─────────────────────────────────────────────
    /// The external program could not be started at all.
    #[error("Failed to launch '{tool}': {source}\nCheck that it is installed and on PATH.")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but reported failure.
    #[error("'{tool}' failed on '{path}' ({status})\n{stderr}")]
    ToolFailed {
        tool: String,
        path: PathBuf,
        status: String,
        stderr: String,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The named LLM provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image, recipe block or parsed file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ItemError {
    /// Reading an input file failed.
    #[error("Failed to read '{path}': {detail}")]
    Read { path: PathBuf, detail: String },

    /// Writing an output file failed.
    #[error("Failed to write '{path}': {detail}")]
    Write { path: PathBuf, detail: String },

    /// The image could not be decoded or converted.
    #[error("Image '{path}' could not be processed: {detail}")]
    Image { path: PathBuf, detail: String },

    /// Text recognition failed.
    #[error("OCR failed for '{path}': {detail}")]
    Ocr { path: PathBuf, detail: String },

    /// The completion API call failed or returned an unusable body.
    #[error("Completion request failed: {detail}")]
    Api { detail: String },

    /// A required section heading was absent.
    #[error("Couldn't find '{heading}' heading")]
    MissingHeading { heading: String },

    /// A heading appeared before one that must precede it.
    #[error("'{heading}' heading comes before '{expected_after}'")]
    HeadingOutOfOrder {
        heading: String,
        expected_after: String,
    },

    /// A section was present but contained no text.
    #[error("Section '{field}' is empty")]
    EmptyField { field: String },

    /// The document could not be assembled.
    #[error("Document could not be built: {detail}")]
    Document { detail: String },

    /// The bitmap-cleanup tool exited unsuccessfully.
    #[error("Cleanup of '{path}' failed ({status})")]
    CleanupFailed { path: PathBuf, status: String },
}
