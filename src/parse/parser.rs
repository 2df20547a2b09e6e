use crate::{
    common::{Interner, List},
    parse::{
        error::{ParseError, ParseErrorKind},
        Exp, TokenKind,
    },
};
use text_size::TextRange;

pub(crate) struct Parser<'s, 't> {
    source: &'s str,
    tokens: &'t [(TokenKind, TextRange)],
    pos: usize,
    interner: &'t mut Interner,
}

impl<'s, 't> Parser<'s, 't> {
    pub(crate) fn new(
        source: &'s str,
        tokens: &'t [(TokenKind, TextRange)],
        interner: &'t mut Interner,
    ) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            interner,
        }
    }

    pub(crate) fn program(mut self) -> Result<Vec<Exp>, ParseError> {
        let mut exps = Vec::new();
        while self.peek().is_some() {
            exps.push(self.exp()?);
        }
        Ok(exps)
    }

    fn exp(&mut self) -> Result<Exp, ParseError> {
        let (kind, range) = self.peek().ok_or_else(|| self.eof_error())?;
        self.bump();
        match kind {
            TokenKind::LParen => self.list(range),
            TokenKind::Number => {
                let text = self.text(range);
                let value = text
                    .parse()
                    .map_err(|_| ParseError::new(ParseErrorKind::InvalidNumber, range))?;
                Ok(Exp::Number(value))
            }
            TokenKind::Str => {
                let text = self.text(range);
                Ok(Exp::Str(text[1..text.len() - 1].to_string()))
            }
            TokenKind::Symbol => {
                let key = self.interner.intern(self.text(range));
                Ok(Exp::Symbol(key))
            }
            TokenKind::Error => Err(ParseError::new(ParseErrorKind::UnknownToken, range)),
            TokenKind::RParen => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken(kind),
                range,
            )),
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => {
                unreachable!("trivia is skipped by `peek`")
            }
        }
    }

    fn list(&mut self, open: TextRange) -> Result<Exp, ParseError> {
        let mut items = List::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::new(ParseErrorKind::UnclosedList, open)),
                Some((TokenKind::RParen, _)) => {
                    self.bump();
                    return Ok(Exp::List(items));
                }
                Some(_) => items.push(self.exp()?),
            }
        }
    }

    fn peek(&mut self) -> Option<(TokenKind, TextRange)> {
        while let Some(&(kind, _)) = self.tokens.get(self.pos) {
            if kind.is_trivia() {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn text(&self, range: TextRange) -> &'s str {
        &self.source[std::ops::Range::<usize>::from(range)]
    }

    fn eof_error(&self) -> ParseError {
        let end = text_size::TextSize::of(self.source);
        ParseError::new(ParseErrorKind::UnexpectedEof, TextRange::new(end, end))
    }
}
