use super::lexer::TokenKind;
use crate::common::NonEmpty;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("(at position {}): {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        found: TokenKind,
        text: String,
        expected: NonEmpty<&'static str>,
    },
    UnexpectedEnd {
        expected: NonEmpty<&'static str>,
    },
    UnknownIdentifier(String),
    InvalidToken(String),
    TrailingInput(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                found,
                text,
                expected,
            } => write!(
                f,
                "unexpected {} {:?}, expected {}",
                found,
                text,
                expected.fmt_expected()
            ),
            Self::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of input, expected {}", expected.fmt_expected())
            }
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier {:?}", name),
            Self::InvalidToken(text) => write!(f, "invalid input {:?}", text),
            Self::TrailingInput(text) => write!(f, "unexpected input after expression: {:?}", text),
        }
    }
}

trait FormatExpected {
    fn fmt_expected(&self) -> String;
}

impl FormatExpected for [&'static str] {
    fn fmt_expected(&self) -> String {
        match self {
            [] => String::new(),
            [a] => a.to_string(),
            [a, b] => format!("{} or {}", a, b),
            s => format!("{}, or {}", s[..s.len() - 1].join(", "), s[s.len() - 1]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::vec1;

    #[test]
    fn display() {
        let err = ParseError {
            kind: ParseErrorKind::UnexpectedToken {
                found: TokenKind::RightParen,
                text: ")".to_string(),
                expected: vec1!["a number", "'('", "'{'"],
            },
            span: 3..4,
            slice: ")".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "(at position 3): unexpected ')' \")\", expected a number, '(', or '{'"
        );

        let err = ParseError {
            kind: ParseErrorKind::UnexpectedEnd {
                expected: vec1!["')'"],
            },
            span: 5..5,
            slice: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "(at position 5): unexpected end of input, expected ')'"
        );
    }
}
