//! Error types for placeholder syntax

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

pub use crate::placeholder::lexer::Span;
use crate::placeholder::lexer::Token;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaceholderError {
    #[error("Syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("Unclosed placeholder at {span:?}: missing '}}}}'")]
    Unclosed { span: Span },

    #[error("Unknown directive '.{name}' at {span:?}: only '.map' is supported")]
    UnknownDirective { span: Span, name: String },

    #[error("Malformed var() at {span:?}: {message}")]
    CssVar { span: Span, message: String },
}

impl PlaceholderError {
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn css_var(span: Span, message: impl Into<String>) -> Self {
        Self::CssVar {
            span,
            message: message.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Syntax { span, .. }
            | Self::Unclosed { span }
            | Self::UnknownDirective { span, .. }
            | Self::CssVar { span, .. } => span.clone(),
        }
    }

    /// Short description without the span
    pub fn message(&self) -> String {
        match self {
            Self::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{} (expected {})", message, expected.join(", "))
                }
            }
            Self::Unclosed { .. } => "unclosed placeholder, missing '}}'".to_string(),
            Self::UnknownDirective { name, .. } => {
                format!("unknown directive '.{}', only '.map' is supported", name)
            }
            Self::CssVar { message, .. } => message.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let span = self.span();
        let title = match self {
            Self::Syntax { message, .. } => message.clone(),
            _ => self.message(),
        };

        let _ = Report::build(ReportKind::Error, filename, span.start)
            .with_message(title)
            .with_label(
                Label::new((filename, span))
                    .with_message(self.message())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for PlaceholderError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("Unexpected {}", format_token(tok)),
                None => "Unexpected end of placeholder".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("'}}'".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        PlaceholderError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string '{}'", s),
        Token::Integer(n) => format!("index {}", n),
        Token::Or => "'||'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::Invalid(s) => format!("character '{}'", s),
    }
}
