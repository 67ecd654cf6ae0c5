//! Search options.

use serde::{Deserialize, Serialize};

/// How a query string is interpreted and scored.
///
/// The options combine freely. With `find_similar` set the query string is
/// never parsed: operators, quotes and asterisks are plain text.
///
/// # Examples
///
/// ```
/// use lectern::search::options::SearchOptions;
///
/// let options = SearchOptions::DEFAULT.with_space_means_or(true);
/// assert_eq!(options.bits(), 2);
/// assert_eq!(SearchOptions::from_bits(2), options);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Skip relevance computation; every match gets the neutral score.
    pub no_relevance_scores: bool,
    /// Whitespace between operands means OR instead of AND.
    pub space_means_or: bool,
    /// Rank documents by similarity to the query text.
    pub find_similar: bool,
}

impl SearchOptions {
    pub const NO_RELEVANCE_SCORES: u32 = 1;
    pub const SPACE_MEANS_OR: u32 = 1 << 1;
    pub const FIND_SIMILAR: u32 = 1 << 2;

    /// Relevance scores on, whitespace means AND, no similarity.
    pub const DEFAULT: SearchOptions = SearchOptions {
        no_relevance_scores: false,
        space_means_or: false,
        find_similar: false,
    };

    pub fn with_no_relevance_scores(mut self, value: bool) -> Self {
        self.no_relevance_scores = value;
        self
    }

    pub fn with_space_means_or(mut self, value: bool) -> Self {
        self.space_means_or = value;
        self
    }

    pub fn with_find_similar(mut self, value: bool) -> Self {
        self.find_similar = value;
        self
    }

    /// Decode a flag mask. Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        SearchOptions {
            no_relevance_scores: bits & Self::NO_RELEVANCE_SCORES != 0,
            space_means_or: bits & Self::SPACE_MEANS_OR != 0,
            find_similar: bits & Self::FIND_SIMILAR != 0,
        }
    }

    /// Encode as a flag mask.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.no_relevance_scores {
            bits |= Self::NO_RELEVANCE_SCORES;
        }
        if self.space_means_or {
            bits |= Self::SPACE_MEANS_OR;
        }
        if self.find_similar {
            bits |= Self::FIND_SIMILAR;
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(SearchOptions::default(), SearchOptions::DEFAULT);
        assert_eq!(SearchOptions::DEFAULT.bits(), 0);
    }

    #[test]
    fn test_flag_mask() {
        let options = SearchOptions::from_bits(1 | 4 | 64);
        assert!(options.no_relevance_scores);
        assert!(!options.space_means_or);
        assert!(options.find_similar);
        assert_eq!(options.bits(), 5);
    }
}
