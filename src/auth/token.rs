use rand::RngCore;
use rand_core::OsRng;

use crate::model::session::Token;

/// Random non-negative bearer token.
pub fn generate_token() -> Token {
    let mut rng = OsRng;
    (rng.next_u64() >> 1) as Token
}

pub fn parse_token(token: &str) -> Option<Token> {
    token.trim().parse::<Token>().ok().filter(|token| *token >= 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_parse_back() {
        let token = generate_token();
        assert_eq!(parse_token(&token.to_string()), Some(token));
    }

    #[test]
    fn garbage_is_not_a_token() {
        assert_eq!(parse_token("not-a-token"), None);
        assert_eq!(parse_token("-5"), None);
        assert_eq!(parse_token(""), None);
    }
}
