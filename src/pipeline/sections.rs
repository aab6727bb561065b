//! Grammar for the completion API's answer.
//!
//! The answer must contain three markers in this order:
//!
//! ```text
//! Recipe Name: <name> Ingredients: <free text> Method: <free text>
//! ```
//!
//! Each marker is searched only after the end of the previous one, so a
//! stray `Method:` inside the preamble cannot be mistaken for the method
//! heading. Everything before `Recipe Name: ` is ignored.

use crate::error::ItemError;
use crate::recipe::Recipe;

pub const NAME_MARKER: &str = "Recipe Name: ";
pub const INGREDIENTS_MARKER: &str = "Ingredients:";
pub const METHOD_MARKER: &str = "Method:";

/// The three free-text sections of an answer, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSections<'a> {
    pub name: &'a str,
    pub ingredients: &'a str,
    pub method: &'a str,
}

/// Split an answer into its sections.
pub fn parse_response(text: &str) -> Result<ResponseSections<'_>, ItemError> {
    let markers = [NAME_MARKER, INGREDIENTS_MARKER, METHOD_MARKER];
    // (start of marker, start of section body)
    let mut spans = [(0usize, 0usize); 3];
    let mut cursor = 0;

    for (slot, marker) in markers.iter().enumerate() {
        let at = text[cursor..]
            .find(marker)
            .map(|offset| cursor + offset)
            .ok_or_else(|| ItemError::MissingHeading {
                heading: marker.trim_end().to_string(),
            })?;
        cursor = at + marker.len();
        spans[slot] = (at, cursor);
    }

    let [(_, name_body), (ingredients_at, ingredients_body), (method_at, method_body)] = spans;
    Ok(ResponseSections {
        name: text[name_body..ingredients_at].trim(),
        ingredients: text[ingredients_body..method_at].trim(),
        method: text[method_body..].trim(),
    })
}

impl ResponseSections<'_> {
    /// One ingredient or step per non-blank line; the name is collapsed to a
    /// single line.
    pub fn into_recipe(self) -> Result<Recipe, ItemError> {
        let name = self.name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(ItemError::EmptyField {
                field: "Recipe Name".into(),
            });
        }
        Ok(Recipe {
            name,
            ingredients: non_blank_lines(self.ingredients),
            method: non_blank_lines(self.method),
        })
    }
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_answer() {
        let s = parse_response("Recipe Name: Soup\nIngredients:\nWater\nSalt\nMethod:\nBoil it\n").unwrap();
        assert_eq!(
            s,
            ResponseSections {
                name: "Soup",
                ingredients: "Water\nSalt",
                method: "Boil it",
            }
        );
    }

    #[test]
    fn preamble_is_ignored() {
        let s = parse_response("Sure! Here it is.\n\nRecipe Name: Tea\nIngredients: water\nMethod: boil").unwrap();
        assert_eq!(s.name, "Tea");
        assert_eq!(s.ingredients, "water");
        assert_eq!(s.method, "boil");
    }

    #[test]
    fn single_line_answer() {
        let s = parse_response("Recipe Name: Toast Ingredients: bread Method: toast it").unwrap();
        assert_eq!(s.name, "Toast");
        assert_eq!(s.ingredients, "bread");
        assert_eq!(s.method, "toast it");
    }

    #[test]
    fn missing_method() {
        let err = parse_response("Recipe Name: Tea\nIngredients:\nwater\n").unwrap_err();
        assert_eq!(
            err,
            ItemError::MissingHeading {
                heading: "Method:".into()
            }
        );
    }

    #[test]
    fn missing_name() {
        let err = parse_response("Ingredients:\nwater\nMethod:\nboil\n").unwrap_err();
        assert_eq!(
            err,
            ItemError::MissingHeading {
                heading: "Recipe Name:".into()
            }
        );
    }

    #[test]
    fn out_of_order_headings_are_rejected() {
        let err = parse_response("Recipe Name: Tea\nMethod:\nboil\nIngredients:\nwater\n").unwrap_err();
        assert_eq!(
            err,
            ItemError::MissingHeading {
                heading: "Method:".into()
            }
        );
    }

    #[test]
    fn into_recipe_splits_lines() {
        let recipe = parse_response("Recipe Name:  Pea\n  Soup \nIngredients:\n\npeas\n\nstock\nMethod:\nsimmer\n\nblend")
            .unwrap()
            .into_recipe()
            .unwrap();
        assert_eq!(recipe, Recipe::new("Pea Soup", ["peas", "stock"], ["simmer", "blend"]));
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = parse_response("Recipe Name: \nIngredients:\nx\nMethod:\ny")
            .unwrap()
            .into_recipe()
            .unwrap_err();
        assert!(matches!(err, ItemError::EmptyField { .. }));
    }
}
