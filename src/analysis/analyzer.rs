use std::collections::HashSet;

use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::fold::FoldFilter;
use crate::analysis::filters::length::MinLengthFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};

/// Text analysis pipeline feeding the word-search indexes.
pub struct Analyzer {
    tokenizer: Box<dyn Tokenizer>,
    filters: Vec<Box<dyn TokenFilter>>,
}

impl Analyzer {
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// The pipeline used for every searchable text field: lowercase folded
    /// letters only, English stop words out, at least three characters.
    pub fn search_english() -> Self {
        Analyzer::new(Box::new(StandardTokenizer))
            .add_filter(Box::new(FoldFilter))
            .add_filter(Box::new(StopWordFilter::english()))
            .add_filter(Box::new(MinLengthFilter { min_chars: 3 }))
    }

    /// Runs the full pipeline and drops duplicate words, keeping the
    /// first-seen order.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let mut tokens = self.tokenizer.tokenize(text);
        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        let mut seen = HashSet::new();
        let mut words = Vec::with_capacity(tokens.len());
        for token in tokens {
            if seen.insert(token.text.clone()) {
                words.push(token.text);
            }
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_deduplicates() {
        let analyzer = Analyzer::search_english();
        let words = analyzer.analyze("The Castles of Burgundy: the castles expansion");
        assert_eq!(words, ["castles", "burgundy", "expansion"]);
    }

    #[test]
    fn strips_stop_words_and_short_tokens() {
        let analyzer = Analyzer::search_english();
        let words = analyzer.analyze("A game of go at an inn");
        assert_eq!(words, ["game", "inn"]);
    }

    #[test]
    fn folds_accents_before_matching() {
        let analyzer = Analyzer::search_english();
        let words = analyzer.analyze("Café International");
        assert_eq!(words, ["cafe", "international"]);
    }

    #[test]
    fn drops_numbers_and_empty_input() {
        let analyzer = Analyzer::search_english();
        assert_eq!(analyzer.analyze("7 Wonders 2nd edition"), ["wonders", "edition"]);
        assert!(analyzer.analyze("").is_empty());
    }
}
