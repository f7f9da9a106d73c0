use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Lexer, Token, TokenKind, TokenSource};
use crate::common::*;
use crate::roll::num::Number;
use crate::tree::{NodeId, NodeKind, Tree};

/// A parsed tree and everything that went wrong while building it.
///
/// Parsing never fails outright: malformed input is reported in `errors` and patched over so the
/// tree always has a root.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub tree: Tree,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn root(&self) -> Option<NodeId> {
        self.tree.root()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Parser<'a, S> {
    tokens: S,
    /// The unread tail of an identifier whose head was taken as a modifier or dice code.
    rest: Option<Token<'a>>,
    tree: Tree,
    errors: Vec<ParseError>,
    /// Offset just past the last consumed token.
    end: usize,
}

impl<'a> Parser<'a, Lexer<'a>> {
    pub fn from_source(source: &'a str) -> Self {
        Self::new(Lexer::new(source))
    }
}

impl<'a, S: TokenSource<'a>> Parser<'a, S> {
    const ADDITION_OPS: &'static [TokenKind] = &[TokenKind::Plus, TokenKind::Minus];

    const MULTIPLICATION_OPS: &'static [TokenKind] =
        &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent];

    const EXPONENT_OPS: &'static [TokenKind] = &[TokenKind::Caret, TokenKind::StarStar];

    const SEPARATORS: &'static [TokenKind] = &[TokenKind::Comma, TokenKind::Semicolon];

    const DICE_CODES: &'static [&'static str] = &["d", "dF"];

    const MODIFIER_CODES: &'static [&'static str] = &[
        "k", "kh", "kl", "km", "d", "dh", "dl", "dm", "c", "cs", "cf", "r", "ro", "s", "sa", "sd",
        "f",
    ];

    pub fn new(tokens: S) -> Self {
        Self {
            tokens,
            rest: None,
            tree: Tree::new(),
            errors: Vec::new(),
            end: 0,
        }
    }

    pub fn parse(mut self) -> ParseResult {
        let root = if self.peek_token().is_none() {
            self.unexpected_token(vec1!["an expression"]);
            self.placeholder()
        } else {
            self.parse_expression()
        };

        if let Some(token) = self.advance() {
            self.error_at(token, ParseErrorKind::TrailingInput(token.text.to_string()));
        }

        self.tree.set_root(root);
        ParseResult {
            tree: self.tree,
            errors: self.errors,
        }
    }

    /// The nodes built so far, for inspecting the output of a single `parse_*` step.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn peek_token(&mut self) -> Option<Token<'a>> {
        match self.rest {
            Some(token) => Some(token),
            None => self.tokens.peek().copied(),
        }
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.peek_token().map(|token| token.kind)
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = match self.rest.take() {
            Some(token) => token,
            None => self.tokens.next()?,
        };
        self.end = token.offset + token.text.len();
        Some(token)
    }

    /// The longest of `codes` that the next identifier starts with.
    fn peek_code(&mut self, codes: &[&'static str]) -> Option<&'static str> {
        let token = self.peek_token()?;
        if token.kind != TokenKind::Identifier {
            return None;
        }
        codes
            .iter()
            .copied()
            .filter(|code| token.text.starts_with(code))
            .max_by_key(|code| code.len())
    }

    /// Consumes `code` from the front of the next identifier, leaving the rest to be read next.
    fn advance_code(&mut self, code: &str) -> Option<Token<'a>> {
        let token = self.advance()?;
        if code.len() >= token.text.len() {
            return Some(token);
        }
        let (head, tail) = token.text.split_at(code.len());
        self.rest = Some(Token::new(token.kind, token.offset + head.len(), tail));
        self.end = token.offset + head.len();
        Some(Token::new(token.kind, token.offset, head))
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn matches_any(&mut self, options: &[TokenKind]) -> bool {
        self.peek_kind().map_or(false, |kind| options.contains(&kind))
    }

    fn matches_word(&mut self, words: &[&str]) -> bool {
        self.peek_token()
            .map_or(false, |t| t.kind == TokenKind::Identifier && words.contains(&t.text))
    }

    fn consume(&mut self, kind: TokenKind, expected: &'static str) -> bool {
        if self.matches(kind) {
            self.advance();
            true
        } else {
            self.unexpected_token(vec1![expected]);
            false
        }
    }

    fn error_at(&mut self, token: Token<'a>, kind: ParseErrorKind) {
        self.errors.push(ParseError {
            kind,
            span: token.span(),
            slice: token.text.to_string(),
        });
    }

    /// Reports the next token without consuming it.
    fn unexpected_token(&mut self, expected: NonEmpty<&'static str>) {
        match self.peek_token() {
            Some(token) => self.error_at(
                token,
                ParseErrorKind::UnexpectedToken {
                    found: token.kind,
                    text: token.text.to_string(),
                    expected,
                },
            ),
            None => self.errors.push(ParseError {
                kind: ParseErrorKind::UnexpectedEnd { expected },
                span: self.end..self.end,
                slice: String::new(),
            }),
        }
    }

    fn node(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        let id = self.tree.create(kind);
        for &child in children {
            self.tree.add_child(id, child);
        }
        id
    }

    fn placeholder(&mut self) -> NodeId {
        self.tree.create(NodeKind::Number(Number::ZERO))
    }

    pub fn parse_expression(&mut self) -> NodeId {
        let mut lhs = self.parse_addition();

        while let Some(op) = self.peek_comparison() {
            self.advance();
            let rhs = self.parse_addition();
            lhs = self.node(NodeKind::Compare(op), &[lhs, rhs]);
        }

        while self.matches_word(&["f"]) {
            let modifier = self.parse_subtract_failure();
            self.tree.insert_child(modifier, 0, lhs);
            lhs = modifier;
        }

        lhs
    }

    fn peek_comparison(&mut self) -> Option<CompareOp> {
        Some(match self.peek_kind()? {
            TokenKind::Equal => CompareOp::Equal,
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::GreaterEqual => CompareOp::GreaterOrEqual,
            TokenKind::Less => CompareOp::Less,
            TokenKind::LessEqual => CompareOp::LessOrEqual,
            _ => return None,
        })
    }

    fn parse_addition(&mut self) -> NodeId {
        let mut lhs = self.parse_multiplication();

        while self.matches_any(Self::ADDITION_OPS) {
            let op = match self.advance().map(|t| t.kind) {
                Some(TokenKind::Minus) => BinaryOperator::Subtract,
                _ => BinaryOperator::Add,
            };
            let rhs = self.parse_multiplication();
            lhs = self.node(NodeKind::Binary(op), &[lhs, rhs]);
        }

        lhs
    }

    fn parse_multiplication(&mut self) -> NodeId {
        let mut lhs = self.parse_exponent();

        while self.matches_any(Self::MULTIPLICATION_OPS) {
            let op = match self.advance().map(|t| t.kind) {
                Some(TokenKind::Slash) => BinaryOperator::Divide,
                Some(TokenKind::Percent) => BinaryOperator::Modulo,
                _ => BinaryOperator::Multiply,
            };
            let rhs = self.parse_exponent();
            lhs = self.node(NodeKind::Binary(op), &[lhs, rhs]);
        }

        lhs
    }

    fn parse_exponent(&mut self) -> NodeId {
        let lhs = self.parse_unary();

        if self.matches_any(Self::EXPONENT_OPS) {
            self.advance();
            let rhs = self.parse_exponent();
            self.node(NodeKind::Binary(BinaryOperator::Exponent), &[lhs, rhs])
        } else {
            lhs
        }
    }

    fn parse_unary(&mut self) -> NodeId {
        if self.matches(TokenKind::Minus) {
            self.advance();
            let operand = self.parse_unary();
            self.node(NodeKind::Negate, &[operand])
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> NodeId {
        let mut target = self.parse_primary();
        if !self.tree[target].kind.is_pool() {
            return target;
        }

        while let Some(modifier) = self.parse_modifier() {
            self.tree.insert_child(modifier, 0, target);
            target = modifier;
        }

        target
    }

    fn parse_primary(&mut self) -> NodeId {
        let token = match self.peek_token() {
            Some(token) => token,
            None => {
                self.unexpected_token(vec1!["a number", "a dice", "'('", "'{'"]);
                return self.placeholder();
            }
        };

        match token.kind {
            TokenKind::Number => {
                let count = self.parse_number();
                self.parse_dice_after(Some(count))
            }
            TokenKind::LeftParen => {
                let inner = self.parse_parenthesized();
                self.parse_dice_after(Some(inner))
            }
            TokenKind::LeftBrace => self.parse_group(),
            TokenKind::String => self.parse_string(),
            TokenKind::Identifier if token.text == "d" || token.text.starts_with("dF") => {
                self.parse_dice(None)
            }
            TokenKind::Identifier => {
                self.advance();
                if self.matches(TokenKind::LeftParen) {
                    self.parse_call(token.text)
                } else {
                    self.error_at(token, ParseErrorKind::UnknownIdentifier(token.text.to_string()));
                    self.placeholder()
                }
            }
            TokenKind::Error => {
                self.advance();
                self.error_at(token, ParseErrorKind::InvalidToken(token.text.to_string()));
                self.placeholder()
            }
            _ => {
                self.unexpected_token(vec1!["a number", "a dice", "'('", "'{'"]);
                self.placeholder()
            }
        }
    }

    pub fn parse_number(&mut self) -> NodeId {
        let token = match self.peek_token() {
            Some(token) if token.kind == TokenKind::Number => token,
            _ => {
                self.unexpected_token(vec1!["a number"]);
                return self.placeholder();
            }
        };
        self.advance();

        let x = if let Ok(x) = token.text.parse::<Int>() {
            Number::Int(x)
        } else if let Ok(x) = token.text.parse::<Float>() {
            Number::Float(x)
        } else {
            self.error_at(token, ParseErrorKind::InvalidToken(token.text.to_string()));
            Number::ZERO
        };
        self.tree.create(NodeKind::Number(x))
    }

    pub fn parse_string(&mut self) -> NodeId {
        let text = match self.advance() {
            Some(token) => token.text,
            None => "",
        };
        let content = text
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(text);
        self.tree.create(NodeKind::String(content.to_string()))
    }

    fn parse_parenthesized(&mut self) -> NodeId {
        self.advance();
        let inner = self.parse_expression();
        self.consume(TokenKind::RightParen, "')'");
        inner
    }

    fn parse_dice_after(&mut self, count: Option<NodeId>) -> NodeId {
        if self.peek_code(Self::DICE_CODES).is_some() {
            self.parse_dice(count)
        } else {
            count.unwrap_or_else(|| self.placeholder())
        }
    }

    /// Parses from the `d` (or `dF`) of a dice literal; a missing count means one die.
    pub fn parse_dice(&mut self, count: Option<NodeId>) -> NodeId {
        let code = self.peek_code(Self::DICE_CODES).unwrap_or("d");
        self.advance_code(code);
        let fate = code == "dF";
        let count = match count {
            Some(count) => count,
            None => self.tree.create(NodeKind::Number(Number::Int(1))),
        };
        let sides = if fate {
            self.tree.create(NodeKind::DiceSides(Sides::Fate))
        } else {
            self.parse_sides()
        };
        self.node(NodeKind::Dice { sides: None }, &[count, sides])
    }

    fn parse_sides(&mut self) -> NodeId {
        match self.peek_kind() {
            Some(TokenKind::Number) => {
                let number = self.parse_number();
                let sides = match self.tree[number].kind {
                    NodeKind::Number(x) => x.round(),
                    _ => 0,
                };
                self.tree[number].kind = NodeKind::DiceSides(Sides::Faces(sides));
                number
            }
            Some(TokenKind::Percent) => {
                self.advance();
                self.tree.create(NodeKind::DiceSides(Sides::Faces(100)))
            }
            Some(TokenKind::LeftParen) => self.parse_parenthesized(),
            _ if self.matches_word(&["F"]) => {
                self.advance();
                self.tree.create(NodeKind::DiceSides(Sides::Fate))
            }
            _ => {
                self.unexpected_token(vec1!["a number", "'%'", "'F'", "'('"]);
                self.placeholder()
            }
        }
    }

    pub fn parse_group(&mut self) -> NodeId {
        self.advance();
        let group = self.tree.create(NodeKind::Group);

        if !self.matches(TokenKind::RightBrace) {
            loop {
                let member = self.parse_expression();
                self.tree.add_child(group, member);
                if self.matches_any(Self::SEPARATORS) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightBrace, "'}'");

        if self.tree.child_count(group) == 1 && self.matches(TokenKind::Number) {
            let member = self.tree.children(group)[0];
            let times = self.parse_number();
            let repeat = self.node(NodeKind::Repeat, &[member, times]);
            self.tree.add_child(group, repeat);
        }

        group
    }

    fn parse_call(&mut self, name: &str) -> NodeId {
        self.advance();
        let call = self.tree.create(NodeKind::Function(name.to_string()));

        if !self.matches(TokenKind::RightParen) {
            loop {
                let arg = self.parse_expression();
                self.tree.add_child(call, arg);
                if self.matches(TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "')'");

        call
    }

    /// Parses one modifier suffix into a node holding only its arguments. The caller inserts the
    /// modified expression as its first child. Returns `None` if the next token is not a
    /// modifier.
    ///
    /// Letter codes may run together (`4d6rkh3`); each call takes the longest code at the front
    /// of the identifier.
    pub fn parse_modifier(&mut self) -> Option<NodeId> {
        let token = self.peek_token()?;

        let kind = match token.kind {
            TokenKind::Bang => NodeKind::Explode { penetrate: false },
            TokenKind::BangBang => NodeKind::Explode { penetrate: true },
            TokenKind::Identifier => match self.peek_code(Self::MODIFIER_CODES)? {
                "k" | "kh" => NodeKind::Keep(KeepType::Highest),
                "kl" => NodeKind::Keep(KeepType::Lowest),
                "km" => NodeKind::Keep(KeepType::Middle),
                "d" | "dl" => NodeKind::Drop(KeepType::Lowest),
                "dh" => NodeKind::Drop(KeepType::Highest),
                "dm" => NodeKind::Drop(KeepType::Middle),
                "c" | "cs" => NodeKind::Critical(CriticalType::Success),
                "cf" => NodeKind::Critical(CriticalType::Failure),
                "r" => NodeKind::Reroll { once: false },
                "ro" => NodeKind::Reroll { once: true },
                "s" | "sa" => NodeKind::Sort(SortDirection::Ascending),
                "sd" => NodeKind::Sort(SortDirection::Descending),
                "f" => return Some(self.parse_subtract_failure()),
                _ => return None,
            },
            _ => return None,
        };
        match self.peek_code(Self::MODIFIER_CODES) {
            Some(code) => self.advance_code(code),
            None => self.advance(),
        };

        let modifier = self.tree.create(kind.clone());
        let argument = match kind {
            NodeKind::Keep(_) | NodeKind::Drop(_) if self.matches(TokenKind::Number) => {
                Some(self.parse_number())
            }
            NodeKind::Explode { .. } | NodeKind::Critical(_) | NodeKind::Reroll { .. } => {
                self.parse_condition()
            }
            _ => None,
        };
        if let Some(argument) = argument {
            self.tree.add_child(modifier, argument);
        }

        Some(modifier)
    }

    /// Parses `f` and its optional condition into a node holding only the condition.
    pub fn parse_subtract_failure(&mut self) -> NodeId {
        self.advance_code("f");
        let modifier = self.tree.create(NodeKind::SubtractFailure);
        if let Some(condition) = self.parse_condition() {
            self.tree.add_child(modifier, condition);
        }
        modifier
    }

    /// A comparison against a number, or a bare number meaning equality.
    fn parse_condition(&mut self) -> Option<NodeId> {
        let op = match self.peek_comparison() {
            Some(op) => {
                self.advance();
                op
            }
            None if self.matches(TokenKind::Number) => CompareOp::Equal,
            None => return None,
        };
        let operand = self.parse_condition_operand();
        Some(self.node(NodeKind::Compare(op), &[operand]))
    }

    fn parse_condition_operand(&mut self) -> NodeId {
        if self.matches(TokenKind::Minus) {
            self.advance();
            let operand = self.parse_condition_operand();
            self.node(NodeKind::Negate, &[operand])
        } else {
            self.parse_number()
        }
    }
}

/// Parses `source` into an expression tree.
pub fn parse(source: &str) -> ParseResult {
    Parser::from_source(source).parse()
}
