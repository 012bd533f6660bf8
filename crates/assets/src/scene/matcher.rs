//! Resource name matching.
//!
//! Dragged file sets lose their directory structure and vary in case and
//! percent-encoding, so a reference is tried against the pool with a fixed
//! list of strategies. The first strategy that finds a file wins.

use std::borrow::Cow;

use crate::classify::ResourcePool;
use crate::file::basename;

/// One way of matching a document reference against pool keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// The reference string equals a pool key
    Exact,
    /// Decoded basename equals a pool key
    Basename,
    /// Decoded basename equals a pool key ignoring case
    BasenameIgnoreCase,
    /// A pool key ends with the decoded basename
    Suffix,
}

/// Evaluation order of the strategies.
pub const MATCH_ORDER: [MatchStrategy; 4] = [
    MatchStrategy::Exact,
    MatchStrategy::Basename,
    MatchStrategy::BasenameIgnoreCase,
    MatchStrategy::Suffix,
];

/// A pool entry found for a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMatch<'a> {
    pub key: &'a str,
    pub strategy: MatchStrategy,
}

/// A document reference prepared for matching.
#[derive(Debug)]
struct ReferenceName<'a> {
    raw: &'a str,
    basename: String,
}

impl<'a> ReferenceName<'a> {
    fn new(raw: &'a str) -> Self {
        let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
        Self {
            raw,
            basename: basename(&decoded).to_string(),
        }
    }
}

impl MatchStrategy {
    fn find<'p>(self, name: &ReferenceName<'_>, pool: &'p ResourcePool) -> Option<&'p str> {
        match self {
            Self::Exact => pool.get_key_value(name.raw).map(|(key, _)| key.as_str()),
            Self::Basename => pool
                .get_key_value(name.basename.as_str())
                .map(|(key, _)| key.as_str()),
            Self::BasenameIgnoreCase => {
                let lowered = name.basename.to_lowercase();
                pool.keys()
                    .find(|key| key.to_lowercase() == lowered)
                    .map(String::as_str)
            }
            Self::Suffix => {
                if name.basename.is_empty() {
                    return None;
                }
                pool.keys()
                    .find(|key| key.ends_with(name.basename.as_str()))
                    .map(String::as_str)
            }
        }
    }
}

/// Find the pool entry a document reference points at.
pub fn match_resource<'p>(reference: &str, pool: &'p ResourcePool) -> Option<ResourceMatch<'p>> {
    let name = ReferenceName::new(reference);
    MATCH_ORDER.iter().find_map(|&strategy| {
        strategy
            .find(&name, pool)
            .map(|key| ResourceMatch { key, strategy })
    })
}

/// Whether a URI is a relative file reference rather than `data:`, `blob:`,
/// `http:` or any other scheme.
pub fn is_relative_reference(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return true;
    };
    // A single letter before the colon is a Windows drive, not a scheme.
    let is_scheme = scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    !is_scheme
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::InMemoryFile;

    fn pool(names: &[&str]) -> ResourcePool {
        names
            .iter()
            .map(|name| (name.to_string(), InMemoryFile::new(name, Vec::new())))
            .collect()
    }

    #[test]
    fn test_exact_match() {
        let pool = pool(&["wheel.png"]);
        let found = match_resource("wheel.png", &pool).unwrap();
        assert_eq!(found.key, "wheel.png");
        assert_eq!(found.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_basename_after_decoding() {
        let pool = pool(&["body color.png"]);
        let found = match_resource("textures/body%20color.png", &pool).unwrap();
        assert_eq!(found.key, "body color.png");
        assert_eq!(found.strategy, MatchStrategy::Basename);
    }

    #[test]
    fn test_case_insensitive() {
        let pool = pool(&["texture.png"]);
        let found = match_resource("Texture.PNG", &pool).unwrap();
        assert_eq!(found.key, "texture.png");
        assert_eq!(found.strategy, MatchStrategy::BasenameIgnoreCase);
    }

    #[test]
    fn test_suffix_match() {
        let pool = pool(&["red_body_color.jpg"]);
        let found = match_resource("textures/body_color.jpg", &pool).unwrap();
        assert_eq!(found.key, "red_body_color.jpg");
        assert_eq!(found.strategy, MatchStrategy::Suffix);
    }

    #[test]
    fn test_nested_reference_resolves_flattened_entry() {
        let pool = pool(&["body_color.jpg"]);
        let found = match_resource("textures/body_color.jpg", &pool).unwrap();
        assert_eq!(found.key, "body_color.jpg");
    }

    #[test]
    fn test_earlier_strategy_wins() {
        // Both an exact-case and a different-case entry exist.
        let pool = pool(&["LOGO.png", "logo.png", "big_logo.png"]);
        let found = match_resource("logo.png", &pool).unwrap();
        assert_eq!(found.key, "logo.png");
        assert_eq!(found.strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_no_match() {
        let pool = pool(&["a.png"]);
        assert!(match_resource("b.png", &pool).is_none());
        assert!(match_resource("dir/", &pool).is_none());
    }

    #[test]
    fn test_relative_reference_detection() {
        assert!(is_relative_reference("car.bin"));
        assert!(is_relative_reference("textures/a b.png"));
        assert!(is_relative_reference(r"C:\models\car.bin"));
        assert!(!is_relative_reference("data:application/octet-stream;base64,AAAA"));
        assert!(!is_relative_reference("blob:https://example.com/1234"));
        assert!(!is_relative_reference("https://cdn.example.com/car.bin"));
    }
}
