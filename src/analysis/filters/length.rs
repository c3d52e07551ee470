use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Drops tokens shorter than the minimum (counted in characters, not bytes).
pub struct MinLengthFilter {
    pub min_chars: usize,
}

impl TokenFilter for MinLengthFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter(|token| token.text.chars().count() >= self.min_chars)
            .collect()
    }

    fn name(&self) -> &str {
        "min_length"
    }
}
