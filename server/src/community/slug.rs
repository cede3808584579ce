//! URL slugs derived from community names.

/// Lowercase `name`, drop everything outside `[a-z0-9 ]` and join the
/// remaining words with single hyphens.
///
/// `"Test Co!"` becomes `"test-co"`. Names made only of punctuation yield an
/// empty slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(slugify("Test Co"), "test-co");
    }

    #[test]
    fn test_strips_punctuation_and_collapses_spaces() {
        assert_eq!(slugify("  Rust   & Friends!! "), "rust-friends");
        assert_eq!(slugify("C++ / C# Devs"), "c-c-devs");
    }

    #[test]
    fn test_non_ascii_is_dropped() {
        assert_eq!(slugify("Café Société"), "caf-socit");
    }

    #[test]
    fn test_tabs_are_stripped_not_split() {
        assert_eq!(slugify("ab\tcd"), "abcd");
    }

    #[test]
    fn test_only_punctuation() {
        assert_eq!(slugify("!!!"), "");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: slugs only contain `[a-z0-9-]` with no stray hyphens.
            #[test]
            fn slug_is_well_formed(name in "\\PC{0,64}") {
                let slug = slugify(&name);
                prop_assert!(slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
            }

            /// Property: for plain names the slug keeps every word, in order.
            #[test]
            fn slug_keeps_words(name in "[A-Za-z0-9 ]{0,64}") {
                let slug = slugify(&name);
                let lowered = name.to_lowercase();
                let expected: Vec<&str> = lowered.split_whitespace().collect();
                let actual: Vec<&str> = slug.split('-').filter(|w| !w.is_empty()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
