//! Lexer for placeholder expressions using logos
//!
//! Operates on the text between `{{` and `}}`.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    #[token("||")]
    Or,
    #[token(".")]
    Dot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Integer(usize),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unquote(lex.slice()))]
    String(String),

    /// Anything the lexer does not recognise; kept so the grammar can report it
    Invalid(String),
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Lex input string into tokens with spans
///
/// Unrecognised input becomes [`Token::Invalid`] rather than being dropped.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input).spanned().map(move |(tok, span)| match tok {
        Ok(t) => (t, span),
        Err(()) => (Token::Invalid(input[span.clone()].to_string()), span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_path() {
        let tokens: Vec<_> = lex("content.basics.name").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("content".to_string()),
                Token::Dot,
                Token::Ident("basics".to_string()),
                Token::Dot,
                Token::Ident("name".to_string()),
            ]
        );
    }

    #[test]
    fn test_index_and_default() {
        let tokens: Vec<_> = lex("images[0] || 'none'").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("images".to_string()),
                Token::BracketOpen,
                Token::Integer(0),
                Token::BracketClose,
                Token::Or,
                Token::String("none".to_string()),
            ]
        );
    }

    #[test]
    fn test_double_quoted_with_escape() {
        let tokens: Vec<_> = lex(r#""say \"hi\"""#).map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::String(r#"say "hi""#.to_string())]);
    }

    #[test]
    fn test_invalid_characters_are_kept() {
        let tokens: Vec<_> = lex("a + b").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".to_string()),
                Token::Invalid("+".to_string()),
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let spans: Vec<_> = lex("a.b").map(|(_, s)| s).collect();
        assert_eq!(spans, vec![0..1, 1..2, 2..3]);
    }
}
