// Syntax module - lexing and parsing of rule expressions

pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Lexer;
pub use parser::{parse, Parser};
pub use token::{Spanned, Token};
