//! Cover path templates and the order they are tried in.

use crate::config::LibraryConfig;

const ID_PLACEHOLDER: &str = "{id}";

/// One possible URL shape for a book's cover, e.g. `/get/cover/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverPathCandidate {
    template: String,
}

impl CoverPathCandidate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Candidates from configuration, in priority order.
    pub fn from_config(config: &LibraryConfig) -> Vec<Self> {
        config.cover_paths.iter().map(CoverPathCandidate::new).collect()
    }

    /// Server-relative path for `book_id`.
    pub fn path_for(&self, book_id: &str) -> String {
        self.template.replace(ID_PLACEHOLDER, book_id)
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Indices to try for a list of `len` candidates.
///
/// The hint goes first when it is in range; the rest follow in priority
/// order with the hint skipped. Out-of-range hints are ignored.
pub fn attempt_order(len: usize, hint: Option<usize>) -> Vec<usize> {
    let hint = hint.filter(|&index| index < len);
    hint.into_iter()
        .chain((0..len).filter(|&index| Some(index) != hint))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_for_substitutes_id() {
        let candidate = CoverPathCandidate::new("/cover/v2/{id}");
        assert_eq!(candidate.path_for("42"), "/cover/v2/42");
        assert_eq!(candidate.template(), "/cover/v2/{id}");
    }

    #[test]
    fn test_path_for_substitutes_every_placeholder() {
        let candidate = CoverPathCandidate::new("/books/{id}/cover?book={id}");
        assert_eq!(candidate.path_for("9"), "/books/9/cover?book=9");
    }

    #[test]
    fn test_attempt_order_without_hint() {
        assert_eq!(attempt_order(3, None), vec![0, 1, 2]);
    }

    #[test]
    fn test_attempt_order_hint_first() {
        assert_eq!(attempt_order(3, Some(1)), vec![1, 0, 2]);
        assert_eq!(attempt_order(3, Some(2)), vec![2, 0, 1]);
        assert_eq!(attempt_order(3, Some(0)), vec![0, 1, 2]);
    }

    #[test]
    fn test_attempt_order_ignores_out_of_range_hint() {
        assert_eq!(attempt_order(2, Some(5)), vec![0, 1]);
    }

    #[test]
    fn test_attempt_order_empty() {
        assert!(attempt_order(0, Some(0)).is_empty());
    }

    #[test]
    fn test_from_config_keeps_priority() {
        let config = LibraryConfig {
            cover_paths: vec!["/a/{id}".to_string(), "/b/{id}".to_string()],
            ..LibraryConfig::default()
        };
        let candidates = CoverPathCandidate::from_config(&config);
        assert_eq!(candidates[0].template(), "/a/{id}");
        assert_eq!(candidates[1].template(), "/b/{id}");
    }
}
