use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Normalizes a token to plain lowercase letters: case-folds, flattens the
/// common Latin diacritics, and drops any token that still contains a
/// non-letter (digits, apostrophes, mixed junk).
pub struct FoldFilter;

fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'à'..='å' | 'ā' | 'ă' | 'ą' => out.push('a'),
            'ç' | 'ć' | 'č' => out.push('c'),
            'è'..='ë' | 'ē' | 'ė' | 'ę' => out.push('e'),
            'ì'..='ï' | 'ī' | 'į' => out.push('i'),
            'ñ' | 'ń' => out.push('n'),
            'ò'..='ö' | 'ø' | 'ō' => out.push('o'),
            'ù'..='ü' | 'ū' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'š' | 'ś' => out.push('s'),
            'ž' | 'ź' | 'ż' => out.push('z'),
            'ď' => out.push('d'),
            'ť' => out.push('t'),
            'ł' => out.push('l'),
            'ř' => out.push('r'),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

impl TokenFilter for FoldFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter_map(|mut token| {
                token.text = fold(&token.text.to_lowercase());
                if !token.text.is_empty() && token.text.chars().all(|c| c.is_alphabetic()) {
                    Some(token)
                } else {
                    None
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "fold"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(words: &[&str]) -> Vec<String> {
        let tokens = words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32))
            .collect();
        FoldFilter
            .filter(tokens)
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(run(&["Café", "NOBLESSE", "señor"]), ["cafe", "noblesse", "senor"]);
    }

    #[test]
    fn drops_tokens_with_non_letters() {
        assert_eq!(run(&["3rd", "d20", "worker"]), ["worker"]);
    }
}
