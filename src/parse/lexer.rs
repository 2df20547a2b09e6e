use logos::Logos;
use text_size::{TextRange, TextSize};

#[must_use]
pub fn lex(source: &str) -> Vec<(TokenKind, TextRange)> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    while let Some(kind) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        tokens.push((kind, range));
    }
    tokens
}

#[derive(Logos, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[regex(r"[0-9]+", priority = 3)]
    Number,
    #[regex(r#""[^"]*""#)]
    Str,
    #[regex(r"[\w+*=!<>/-]+")]
    Symbol,

    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"//[^\r\n]*", priority = 4)]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/", priority = 4)]
    BlockComment,

    #[error]
    Error,
}

impl TokenKind {
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Number => "number",
            Self::Str => "string",
            Self::Symbol => "symbol",
            Self::Whitespace => "whitespace",
            Self::LineComment | Self::BlockComment => "comment",
            Self::Error => "<unknown>",
        }
    }
}
