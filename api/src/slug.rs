use std::sync::LazyLock;

use regex::Regex;

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("valid regex"));
static HYPHEN_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Derive a URL-safe slug from a book title.
///
/// Lower-cases, turns spaces and underscores into hyphens, drops every other
/// non-word character, collapses hyphen runs and trims hyphens at both ends.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase().replace([' ', '_'], "-");
    let stripped = NON_SLUG_RE.replace_all(&lowered, "");
    let collapsed = HYPHEN_RUN_RE.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation() {
        assert_eq!(slugify("Solo Leveling!!"), "solo-leveling");
    }

    #[test]
    fn collapses_and_trims_hyphens() {
        assert_eq!(slugify("  The -- Hobbit__Returns  "), "the-hobbit-returns");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(slugify("Café Crème 2"), "caf-crme-2");
    }

    #[test]
    fn is_idempotent() {
        for title in [
            "Solo Leveling!!",
            "A Tale of Two Cities",
            "  -weird__ title-- ",
            "Harry Potter & the Philosopher's Stone",
            "",
        ] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {title:?}");
        }
    }
}
