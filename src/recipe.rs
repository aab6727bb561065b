//! The parsed recipe record and its on-disk text format.
//!
//! ```text
//! Recipe: Tomato Soup
//!
//! Ingredients:
//! 4 tomatoes
//! 1 onion
//!
//! Method:
//! Chop everything.
//! Simmer for 20 minutes.
//! ```
//!
//! Reading is a line-oriented state machine rather than index arithmetic:
//! `Recipe: ` must start its line, the other two headings may appear
//! anywhere on their line, and they must come in the order above.

use crate::error::ItemError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const NAME_HEADER: &str = "Recipe: ";
pub const INGREDIENTS_HEADER: &str = "Ingredients:";
pub const METHOD_HEADER: &str = "Method:";
/// Method lines stop at the first line containing this.
pub const NOTES_HEADER: &str = "Notes:";

/// A recipe split into its three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub method: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Ingredients { closed: bool },
    Method,
    Notes,
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        ingredients: impl IntoIterator<Item = impl Into<String>>,
        method: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            method: method.into_iter().map(Into::into).collect(),
        }
    }

    /// Serialise in the parsed-file format.
    pub fn to_parsed_text(&self) -> String {
        format!(
            "{NAME_HEADER}{}\n\n{INGREDIENTS_HEADER}\n{}\n\n{METHOD_HEADER}\n{}\n",
            self.name,
            self.ingredients.join("\n"),
            self.method.join("\n"),
        )
    }

    /// Read a parsed file back.
    ///
    /// Ingredients are the non-blank lines after the heading up to the first
    /// blank line. Method lines run until a `Notes:` line or end of input;
    /// blank method lines are skipped.
    pub fn from_parsed_text(text: &str) -> Result<Self, ItemError> {
        let mut name: Option<String> = None;
        let mut ingredients = Vec::new();
        let mut method = Vec::new();
        let mut section = Section::Preamble;
        let mut ingredients_before_name = false;

        for line in text.lines() {
            section = match section {
                Section::Preamble => {
                    if name.is_none() {
                        if let Some(rest) = line.strip_prefix(NAME_HEADER) {
                            name = Some(rest.trim().to_string());
                        } else if line.contains(INGREDIENTS_HEADER) {
                            ingredients_before_name = true;
                        }
                        Section::Preamble
                    } else if line.contains(INGREDIENTS_HEADER) {
                        Section::Ingredients { closed: false }
                    } else {
                        Section::Preamble
                    }
                }
                Section::Ingredients { closed } => {
                    if line.contains(METHOD_HEADER) {
                        Section::Method
                    } else if closed {
                        section
                    } else if line.trim().is_empty() {
                        Section::Ingredients { closed: true }
                    } else {
                        ingredients.push(line.trim().to_string());
                        section
                    }
                }
                Section::Method => {
                    if line.contains(NOTES_HEADER) {
                        Section::Notes
                    } else {
                        if !line.trim().is_empty() {
                            method.push(line.trim().to_string());
                        }
                        section
                    }
                }
                Section::Notes => break,
            };
        }

        let missing = |heading: &str| ItemError::MissingHeading {
            heading: heading.to_string(),
        };
        let name = name.ok_or_else(|| missing(NAME_HEADER.trim_end()))?;
        if name.is_empty() {
            return Err(ItemError::EmptyField {
                field: "Recipe".into(),
            });
        }
        match section {
            Section::Preamble if ingredients_before_name => Err(ItemError::HeadingOutOfOrder {
                heading: INGREDIENTS_HEADER.to_string(),
                expected_after: NAME_HEADER.trim_end().to_string(),
            }),
            Section::Preamble => Err(missing(INGREDIENTS_HEADER)),
            Section::Ingredients { .. } => Err(missing(METHOD_HEADER)),
            Section::Method | Section::Notes => Ok(Self {
                name,
                ingredients,
                method,
            }),
        }
    }

    /// `<stem>_parsed.txt` for this recipe.
    pub fn parsed_file_name(&self) -> String {
        format!("{}_parsed.txt", file_stem(&self.name))
    }

    /// `<stem>.docx` for this recipe.
    pub fn docx_file_name(&self) -> String {
        format!("{}.docx", file_stem(&self.name))
    }
}

static RE_UNSAFE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s/\\:*?"<>|]"#).unwrap());

/// Recipe name as a file stem: whitespace and path-hostile characters
/// become underscores.
pub fn file_stem(name: &str) -> String {
    let stem = RE_UNSAFE_FILENAME.replace_all(name.trim(), "_");
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "recipe".to_string()
    } else {
        stem.into_owned()
    }
}
