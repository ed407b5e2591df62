// Expression tokens for lexical analysis

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    True,
    False,

    // Logical operators
    And,
    Or,
    Bang,

    // Comparison operators
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    RegexMatch,
    RegexNotMatch,

    // Arithmetic operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,

    // Special
    Eof,
}

impl Token {
    /// Convert a word to a keyword token if it matches
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s {
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            _ => None,
        }
    }

    /// Human readable form used in syntax errors
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::True => "'true'".to_string(),
            Token::False => "'false'".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Bang => "'!'".to_string(),
            Token::Equal => "'=='".to_string(),
            Token::NotEqual => "'!='".to_string(),
            Token::Less => "'<'".to_string(),
            Token::Greater => "'>'".to_string(),
            Token::LessEqual => "'<='".to_string(),
            Token::GreaterEqual => "'>='".to_string(),
            Token::RegexMatch => "'=~'".to_string(),
            Token::RegexNotMatch => "'!~'".to_string(),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::Percent => "'%'".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// A token together with the character offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

impl Spanned {
    pub fn new(token: Token, offset: usize) -> Self {
        Self { token, offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Token::keyword_from_str("true"), Some(Token::True));
        assert_eq!(Token::keyword_from_str("false"), Some(Token::False));
        // Keywords are case sensitive so record fields like `True` stay addressable
        assert_eq!(Token::keyword_from_str("True"), None);
        assert_eq!(Token::keyword_from_str("unknown"), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Token::RegexMatch.describe(), "'=~'");
        assert_eq!(Token::Eof.describe(), "end of input");
        assert_eq!(
            Token::Identifier("Tags".to_string()).describe(),
            "identifier 'Tags'"
        );
    }
}
