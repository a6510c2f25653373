//! Placeholder tokens embedded in template strings
//!
//! A template string is split into [`Segment`]s: literal text, `{{ path }}`
//! placeholders with an optional `|| 'default'`, and `{{ path.map }}` array
//! directives. `var(--token, fallback)` calls in style values are handled by
//! [`css_var`].

pub mod css_var;
pub mod grammar;
pub mod lexer;

use std::fmt;

pub use grammar::parse_expr;
pub use lexer::Span;

use lexer::Token;

use crate::error::PlaceholderError;

/// The only supported array directive
pub const MAP_DIRECTIVE: &str = "map";

/// Array methods that look like directives but are not supported
pub const ARRAY_METHODS: &[&str] = &[
    "filter", "forEach", "reduce", "join", "slice", "sort", "find", "some", "every",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A dotted lookup path such as `content.specs[0].label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path(pub Vec<PathSegment>);

impl Path {
    /// First key of the path
    pub fn root(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathSegment::Key(k)) => Some(k.as_str()),
            _ => None,
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Everything after the root
    pub fn rest(&self) -> &[PathSegment] {
        self.0.get(1..).unwrap_or(&[])
    }

    fn last_key(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathSegment::Key(k)) if self.0.len() > 1 => Some(k.as_str()),
            _ => None,
        }
    }

    fn without_last(&self) -> Path {
        Path(self.0[..self.0.len().saturating_sub(1)].to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

/// A parsed `{{ … }}` expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub path: Path,
    pub default: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Placeholder(Expr),
    /// `{{ source.map }}`; `source` excludes the trailing `map`
    Directive { source: Path, span: Span },
}

/// Split a template string into segments
///
/// Fails on the first unclosed or malformed token.
pub fn segments(text: &str) -> Result<Vec<Segment>, PlaceholderError> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(found) = text[pos..].find("{{") {
        let start = pos + found;
        if start > pos {
            out.push(Segment::Literal(text[pos..start].to_string()));
        }
        let inner_start = start + 2;
        let close = find_close(text, inner_start).ok_or(PlaceholderError::Unclosed {
                span: start..text.len(),
            })?;

        let expr = parse_expr(&text[inner_start..close], inner_start).map_err(|errs| {
            errs.into_iter()
                .next()
                .unwrap_or_else(|| PlaceholderError::syntax(start..close + 2, "invalid placeholder"))
        })?;
        out.push(classify(expr, start..close + 2)?);
        pos = close + 2;
    }

    if pos < text.len() {
        out.push(Segment::Literal(text[pos..].to_string()));
    }
    Ok(out)
}

/// Byte offset of the `}}` closing a token whose body starts at `from`
///
/// Quoted defaults are lexed as whole strings, so a `}}` inside one does not
/// close the token.
fn find_close(text: &str, from: usize) -> Option<usize> {
    let mut brace_end = None;
    for (token, span) in lexer::lex(&text[from..]) {
        match token {
            Token::Invalid(s) if s == "}" => {
                if brace_end == Some(span.start) {
                    return Some(from + span.start - 1);
                }
                brace_end = Some(span.end);
            }
            _ => brace_end = None,
        }
    }
    None
}

fn classify(expr: Expr, span: Span) -> Result<Segment, PlaceholderError> {
    match expr.path.last_key() {
        Some(MAP_DIRECTIVE) => {
            if expr.default.is_some() {
                return Err(PlaceholderError::syntax(
                    span,
                    "a '.map' directive cannot have a default",
                ));
            }
            Ok(Segment::Directive {
                source: expr.path.without_last(),
                span,
            })
        }
        Some(name) if ARRAY_METHODS.contains(&name) => Err(PlaceholderError::UnknownDirective {
            span,
            name: name.to_string(),
        }),
        _ => Ok(Segment::Placeholder(expr)),
    }
}

/// The directive source path if `text` is exactly one `{{ path.map }}` token
pub fn as_directive(text: &str) -> Option<Path> {
    match segments(text) {
        Ok(segs) => match segs.as_slice() {
            [Segment::Directive { source, .. }] => Some(source.clone()),
            _ => None,
        },
        Err(_) => None,
    }
}

/// Whether `text` contains anything the resolver would substitute
pub fn has_tokens(text: &str) -> bool {
    text.contains("{{") || text.contains("var(")
}
