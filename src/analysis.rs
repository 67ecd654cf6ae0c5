//! Text analysis for Lectern.
//!
//! Turns raw document or query text into normalized terms with stable
//! per-occurrence positions. The pipeline is a [`tokenizer::Tokenizer`]
//! followed by a chain of [`token_filter::Filter`]s, wrapped in an
//! [`analyzer::Analyzer`].

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
