//! Pipeline stages for recipe digitisation.
//!
//! Each submodule implements exactly one transformation step, and every step
//! that touches the outside world (cleanup tool, OCR, completion API, PDF
//! converter) does so behind a trait so tests can swap in fakes.
//!
//! ## Data Flow
//!
//! ```text
//! images/ ──▶ normalize ──▶ extract ──▶ scanned/ ──▶ split ──▶ parsed/ ──▶ render ──▶ pdf
//!            (noteshrink)  (tesseract)             (LLM API)             (docx-rs)  (soffice)
//! ```
//!
//! 1. [`input`]    : list stage input folders, create output folders
//! 2. [`normalize`]: bitmap cleanup subprocess per image
//! 3. [`extract`]  : grayscale + OCR, appended to per-image scanned files
//! 4. [`split`]    : delimiter segmentation and one completion per block
//! 5. [`complete`] : the completion API client; the only network I/O
//! 6. [`postprocess`] / [`sections`]: clean and parse the model's answer
//! 7. [`render`]   : styled DOCX per parsed recipe
//! 8. [`pdf`]      : external DOCX → PDF conversion

pub mod complete;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod pdf;
pub mod postprocess;
pub mod render;
pub mod sections;
pub mod split;
