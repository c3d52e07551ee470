use crate::analysis::token::Token;

pub trait TokenFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;
}
