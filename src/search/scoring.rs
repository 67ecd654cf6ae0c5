//! Relevance scoring.
//!
//! A term match weighs `tf * idf / sqrt(doc_len)` with
//! `idf = 1 + ln((1 + N) / (1 + df))`. Boolean combinators add child
//! scores; `NOT` contributes nothing. Similarity search uses the cosine
//! between raw term-frequency vectors.

/// The fixed score every match gets when relevance scoring is off.
pub const NEUTRAL_SCORE: f32 = 1.0;

/// Scores matches, or skips scoring entirely in neutral mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    compute_relevance: bool,
}

impl Default for Scorer {
    fn default() -> Self {
        Scorer::relevance()
    }
}

impl Scorer {
    /// Score matches by term frequency and rarity.
    pub fn relevance() -> Self {
        Scorer {
            compute_relevance: true,
        }
    }

    /// Give every match [`NEUTRAL_SCORE`].
    pub fn neutral() -> Self {
        Scorer {
            compute_relevance: false,
        }
    }

    /// Whether relevance is computed.
    pub fn computes_relevance(&self) -> bool {
        self.compute_relevance
    }

    /// Inverse document frequency of a term found in `doc_freq` of
    /// `doc_count` documents.
    pub fn idf(&self, doc_freq: usize, doc_count: usize) -> f32 {
        if !self.compute_relevance {
            return 0.0;
        }
        1.0 + ((1.0 + doc_count as f32) / (1.0 + doc_freq as f32)).ln()
    }

    /// Weight of a term (or phrase) occurring `tf` times in a document of
    /// `doc_len` indexed terms.
    pub fn term_weight(&self, tf: u32, idf: f32, doc_len: u32) -> f32 {
        if !self.compute_relevance || tf == 0 {
            return 0.0;
        }
        tf as f32 * idf / (doc_len.max(1) as f32).sqrt()
    }

    /// Cosine similarity given the dot product and both vector norms.
    pub fn cosine(&self, dot: f32, query_norm: f32, doc_norm: f32) -> f32 {
        if !self.compute_relevance {
            return 0.0;
        }
        let denominator = query_norm * doc_norm;
        if denominator <= f32::EPSILON {
            0.0
        } else {
            dot / denominator
        }
    }

    /// The score reported for an evaluated match.
    pub fn finalize(&self, raw: f32) -> f32 {
        if self.compute_relevance {
            raw
        } else {
            NEUTRAL_SCORE
        }
    }
}
