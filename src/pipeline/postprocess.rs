//! Post-processing: deterministic cleanup of the model's answer before the
//! section grammar sees it.
//!
//! Chat models are asked for plain `Recipe Name:` / `Ingredients:` /
//! `Method:` headings but frequently decorate them anyway (`**Method:**`,
//! `## Ingredients:`), wrap the whole answer in a code fence, or answer with
//! CRLF line endings. None of that changes the content, so it is removed
//! here instead of being tolerated inside the grammar.
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF → LF)
//! 2. Strip an outer code fence
//! 3. Strip Markdown decoration from heading markers
//! 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to a raw answer.
pub fn clean_response(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_code_fence(&s);
    let s = undecorate_markers(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\n(.*)\n```\s*$").unwrap());

fn strip_code_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Undecorate heading markers ───────────────────────────────────────
//
// `## Ingredients:`, `**Recipe Name:** Soup`, `**Method**:` all become the
// bare marker followed by a single space. Only line-leading markers are
// touched; inline markers are left for the grammar as they are.

static RE_DECORATED_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?(Recipe Name|Ingredients|Method)(?:\*\*|__)?[ \t]*:(?:\*\*|__)?[ \t]*",
    )
    .unwrap()
});

fn undecorate_markers(input: &str) -> String {
    RE_DECORATED_MARKER.replace_all(input, "${1}: ").into_owned()
}

// ── Rule 4: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sections::parse_response;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_strip_fence() {
        assert_eq!(strip_code_fence("```\nRecipe Name: A\n```"), "Recipe Name: A");
        assert_eq!(strip_code_fence("```text\nx\ny\n```\n"), "x\ny");
    }

    #[test]
    fn test_no_fence_passthrough() {
        assert_eq!(strip_code_fence("Recipe Name: A"), "Recipe Name: A");
    }

    #[test]
    fn test_bold_markers() {
        assert_eq!(
            undecorate_markers("**Recipe Name:** Soup\n**Ingredients:**\nWater"),
            "Recipe Name: Soup\nIngredients: \nWater"
        );
        assert_eq!(undecorate_markers("__Method__: stir"), "Method: stir");
    }

    #[test]
    fn test_heading_markers() {
        assert_eq!(undecorate_markers("## Ingredients:\n- a"), "Ingredients: \n- a");
        assert_eq!(undecorate_markers("### Method :\n1. b"), "Method: \n1. b");
    }

    #[test]
    fn test_plain_markers_keep_their_text() {
        assert_eq!(undecorate_markers("Recipe Name: Soup"), "Recipe Name: Soup");
        assert_eq!(undecorate_markers("Recipe Name:Soup"), "Recipe Name: Soup");
    }

    #[test]
    fn test_inline_marker_untouched() {
        assert_eq!(
            undecorate_markers("Water and **Method:** soon"),
            "Water and **Method:** soon"
        );
    }

    #[test]
    fn test_remove_invisible() {
        assert_eq!(remove_invisible_chars("So\u{200B}up\u{FEFF}"), "Soup");
    }

    #[test]
    fn decorated_answer_parses() {
        let raw = "```markdown\r\n## **Recipe Name:** Soup\r\n\r\n**Ingredients:**\r\n- Water\r\n\r\n**Method:**\r\n1. Boil it\r\n```";
        let cleaned = clean_response(raw);
        let s = parse_response(&cleaned).unwrap();
        assert_eq!(s.name, "Soup");
        assert_eq!(s.ingredients, "- Water");
        assert_eq!(s.method, "1. Boil it");
    }
}
