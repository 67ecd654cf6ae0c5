//! Token filters applied after tokenization.
//!
//! Filters transform or drop tokens but never renumber positions.

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod ascii_folding;
pub mod length;
pub mod lowercase;
pub mod stop;

pub use ascii_folding::AsciiFoldingFilter;
pub use length::MinLengthFilter;
pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}
