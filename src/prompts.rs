//! Prompts for the field-splitting completion call.
//!
//! The response grammar in [`crate::pipeline::sections`] depends on the
//! headings requested here; change both together.

/// System message sent ahead of every recipe block.
///
/// Used when `PipelineConfig::system_prompt` is `None`.
pub const SYSTEM_PROMPT: &str =
    "You restructure OCR transcriptions of cookbook pages into clean recipes.";

/// Instruction placed before the raw recipe block in the user message.
pub const RECIPE_INSTRUCTION: &str = r#"Separate the Recipe Name, Ingredients, and Method to different headings. Make sure to remove any text that is not related to the recipe, such as nutritional information, tips, yield, and no Notes at the end, etc.

Answer in exactly this shape and nothing else:

Recipe Name: <name>
Ingredients:
<one ingredient per line>
Method:
<one step per line>"#;

/// Build the user message for one recipe block.
pub fn recipe_message(block: &str) -> String {
    format!("{}\n\n{}", RECIPE_INSTRUCTION, block)
}
