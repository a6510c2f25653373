//! Parser for placeholder expressions using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::lexer::{lex, Token};
use super::{Expr, Path, PathSegment};
use crate::error::PlaceholderError;

/// Parse the inside of one `{{ … }}` token
///
/// `offset` is the byte position of `input` within the enclosing string, so
/// error spans point into the whole leaf.
pub fn parse_expr(input: &str, offset: usize) -> Result<Expr, Vec<PlaceholderError>> {
    let end = offset + input.len();

    let token_iter = lex(input)
        .map(move |(tok, span)| (tok, SimpleSpan::from(span.start + offset..span.end + offset)));

    let token_stream = Stream::from_iter(token_iter).map((end..end).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let ident = select! {
        Token::Ident(s) => s,
    };

    let index = select! {
        Token::Integer(n) => n,
    }
    .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
    .map(PathSegment::Index);

    let key = just(Token::Dot).ignore_then(ident.clone()).map(PathSegment::Key);

    let path = ident
        .map(PathSegment::Key)
        .then(key.or(index).repeated().collect::<Vec<_>>())
        .map(|(head, rest)| {
            let mut segments = Vec::with_capacity(rest.len() + 1);
            segments.push(head);
            segments.extend(rest);
            Path(segments)
        });

    let default = just(Token::Or).ignore_then(select! {
        Token::String(s) => s,
    });

    path.then(default.or_not())
        .map_with(|(path, default), e| Expr {
            path,
            default,
            span: span_range(&e.span()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_path_with_default() {
        let expr = parse_expr("content.basics.name || 'Amazing Product'", 0).unwrap();
        assert_eq!(
            expr.path,
            Path(vec![
                PathSegment::Key("content".into()),
                PathSegment::Key("basics".into()),
                PathSegment::Key("name".into()),
            ])
        );
        assert_eq!(expr.default.as_deref(), Some("Amazing Product"));
    }

    #[test]
    fn test_parse_index() {
        let expr = parse_expr(" images[2] ", 0).unwrap();
        assert_eq!(
            expr.path,
            Path(vec![PathSegment::Key("images".into()), PathSegment::Index(2)])
        );
        assert_eq!(expr.default, None);
    }

    #[test]
    fn test_trailing_dot_is_an_error() {
        assert!(parse_expr("content.", 0).is_err());
    }

    #[test]
    fn test_default_must_be_a_string() {
        assert!(parse_expr("content.a || b", 0).is_err());
    }

    #[test]
    fn test_error_spans_are_offset() {
        let errs = parse_expr("a + b", 10).unwrap_err();
        assert_eq!(errs[0].span(), 12..13);
    }

    #[test]
    fn test_empty_expression() {
        assert!(parse_expr("  ", 0).is_err());
    }
}
