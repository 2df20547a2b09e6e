pub mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::Exp;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{lex, TokenKind};

use crate::common::Interner;

pub fn parse(source: &str, interner: &mut Interner) -> Result<Vec<Exp>, ParseError> {
    let tokens = lex(source);
    parser::Parser::new(source, &tokens, interner).program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    fn check(source: &str, expect: Expect) {
        let mut interner = Interner::new();
        let actual = match parse(source, &mut interner) {
            Ok(exps) => exps
                .iter()
                .map(|exp| exp.display(&interner))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(err) => format!("{err}"),
        };
        expect.assert_eq(&actual);
    }

    #[test]
    fn number() {
        check("42", expect!["42"]);
    }

    #[test]
    fn string() {
        check(r#""hello""#, expect![[r#""hello""#]]);
    }

    #[test]
    fn symbol() {
        check("foo-bar", expect!["foo-bar"]);
    }

    #[test]
    fn nested_lists() {
        check("(+ 1 (* 2 3))", expect!["(+ 1 (* 2 3))"]);
    }

    #[test]
    fn several_top_level_forms() {
        check(
            "(var x 1) x",
            expect![
                "\
(var x 1)
x"
            ],
        );
    }

    #[test]
    fn comments_are_skipped() {
        check(
            "// leading\n(+ 1 /* inline */ 2)",
            expect!["(+ 1 2)"],
        );
    }

    #[test]
    fn unexpected_close_paren() {
        check(") 1", expect!["parse error at 0..1: unexpected `)`"]);
    }

    #[test]
    fn unclosed_list() {
        check("(+ 1 2", expect!["parse error at 0..1: unclosed list"]);
    }

    #[test]
    fn unknown_token() {
        check("(+ 1 $)", expect!["parse error at 5..6: unrecognized token"]);
    }
}
