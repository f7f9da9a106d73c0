use logos::Logos;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,
    #[regex(r"[a-zA-Z_]+")]
    Identifier,
    #[regex(r#""[^"]*""#)]
    String,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("!!")]
    BangBang,

    #[token("=")]
    Equal,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;

        match self {
            Number => "<number>",
            Identifier => "<identifier>",
            String => "<string>",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            StarStar => "'**'",
            Slash => "'/'",
            Percent => "'%'",
            Caret => "'^'",
            Bang => "'!'",
            BangBang => "'!!'",
            Equal => "'='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Less => "'<'",
            LessEqual => "'<='",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            Semicolon => "';'",
            Error => "<error>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Byte offset of the token in the source.
    pub offset: usize,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub const fn new(kind: TokenKind, offset: usize, text: &'a str) -> Self {
        Self { kind, offset, text }
    }

    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.text.len()
    }
}

/// A stream of tokens with one token of lookahead.
pub trait TokenSource<'a> {
    fn peek(&mut self) -> Option<&Token<'a>>;

    fn next(&mut self) -> Option<Token<'a>>;
}

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    peeked: Option<Option<Token<'a>>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
        }
    }

    fn lex(&mut self) -> Option<Token<'a>> {
        let kind = self.inner.next()?;
        Some(Token::new(kind, self.inner.span().start, self.inner.slice()))
    }
}

impl<'a> TokenSource<'a> for Lexer<'a> {
    fn peek(&mut self) -> Option<&Token<'a>> {
        if self.peeked.is_none() {
            let token = self.lex();
            self.peeked = Some(token);
        }
        self.peeked.as_ref().and_then(Option::as_ref)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.lex(),
        }
    }
}

/// A pre-tokenized stream.
#[derive(Debug, Clone, Default)]
pub struct TokenList<'a> {
    tokens: VecDeque<Token<'a>>,
}

impl<'a> TokenList<'a> {
    pub fn new(tokens: impl IntoIterator<Item = Token<'a>>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> TokenSource<'a> for TokenList<'a> {
    fn peek(&mut self) -> Option<&Token<'a>> {
        self.tokens.front()
    }

    fn next(&mut self) -> Option<Token<'a>> {
        self.tokens.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn check(source: &str, expected: &[(TokenKind, &str)]) {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            tokens.push((token.kind, token.text));
        }
        assert_eq!(tokens, expected);
    }

    #[test]
    fn dice_with_modifiers() {
        check(
            "4d6kh3 + 2",
            &[
                (Number, "4"),
                (Identifier, "d"),
                (Number, "6"),
                (Identifier, "kh"),
                (Number, "3"),
                (Plus, "+"),
                (Number, "2"),
            ],
        );
    }

    #[test]
    fn longest_operator_wins() {
        check(
            "2**3 !! >= <=",
            &[
                (Number, "2"),
                (StarStar, "**"),
                (Number, "3"),
                (BangBang, "!!"),
                (GreaterEqual, ">="),
                (LessEqual, "<="),
            ],
        );
    }

    #[test]
    fn strings_keep_unicode() {
        check("\"@ÊŸ 😀\"", &[(String, "\"@ÊŸ 😀\"")]);
    }

    #[test]
    fn decimals_and_groups() {
        check(
            "{1.5; 2}",
            &[
                (LeftBrace, "{"),
                (Number, "1.5"),
                (Semicolon, ";"),
                (Number, "2"),
                (RightBrace, "}"),
            ],
        );
    }

    #[test]
    fn unknown_input_is_an_error_token() {
        check("1 $ 2", &[(Number, "1"), (Error, "$"), (Number, "2")]);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("3d8");
        assert_eq!(lexer.peek().map(|t| t.kind), Some(Number));
        assert_eq!(lexer.peek().map(|t| t.offset), Some(0));
        assert_eq!(lexer.next(), Some(Token::new(Number, 0, "3")));
        assert_eq!(lexer.next(), Some(Token::new(Identifier, 1, "d")));
        assert_eq!(lexer.next(), Some(Token::new(Number, 2, "8")));
        assert_eq!(lexer.peek(), None);
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn token_list() {
        let mut list = TokenList::new([Token::new(Number, 0, "1"), Token::new(Plus, 1, "+")]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.peek().map(|t| t.kind), Some(Number));
        assert_eq!(list.next().map(|t| t.kind), Some(Number));
        assert_eq!(list.next().map(|t| t.kind), Some(Plus));
        assert!(list.is_empty());
    }
}
