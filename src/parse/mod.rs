mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind, TokenList, TokenSource};
pub use parser::{parse, ParseResult, Parser};
