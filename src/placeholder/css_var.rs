//! Scanner for CSS `var(--token[, fallback])` calls in style values

use super::Span;
use crate::error::PlaceholderError;

#[derive(Debug, Clone, PartialEq)]
pub struct VarCall {
    /// Custom property name without the leading `--`
    pub name: String,
    pub fallback: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CssPart {
    Text(String),
    Var(VarCall),
}

/// Split a style value into plain text and `var()` calls
///
/// Calls nested inside a fallback are left in the fallback text.
pub fn parse(value: &str) -> Result<Vec<CssPart>, PlaceholderError> {
    let mut parts = Vec::new();
    let mut pos = 0;

    while let Some(found) = value[pos..].find("var(") {
        let start = pos + found;
        if start > pos {
            parts.push(CssPart::Text(value[pos..start].to_string()));
        }
        let args_start = start + 4;
        let close = matching_paren(value, args_start).ok_or_else(|| {
            PlaceholderError::css_var(start..value.len(), "unbalanced parentheses in var()")
        })?;
        let span = start..close + 1;
        parts.push(CssPart::Var(parse_args(&value[args_start..close], span)?));
        pos = close + 1;
    }

    if pos < value.len() {
        parts.push(CssPart::Text(value[pos..].to_string()));
    }
    Ok(parts)
}

/// Position of the `)` closing a paren opened just before `from`
fn matching_paren(s: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s[from..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_args(args: &str, span: Span) -> Result<VarCall, PlaceholderError> {
    let (name_part, fallback) = match args.find(',') {
        Some(i) => (&args[..i], Some(args[i + 1..].trim().to_string())),
        None => (args, None),
    };
    let name = name_part
        .trim()
        .strip_prefix("--")
        .ok_or_else(|| PlaceholderError::css_var(span.clone(), "custom property must start with '--'"))?;
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(PlaceholderError::css_var(
            span,
            format!("invalid custom property name '--{}'", name),
        ));
    }
    Ok(VarCall {
        name: name.to_string(),
        fallback,
        span,
    })
}

/// Check every `var()` in `value`, including those nested in fallbacks
pub fn check(value: &str) -> Result<(), PlaceholderError> {
    for part in parse(value)? {
        if let CssPart::Var(call) = part {
            if let Some(fallback) = &call.fallback {
                let offset = call.span.start;
                check(fallback).map_err(|e| shift(e, offset))?;
            }
        }
    }
    Ok(())
}

fn shift(err: PlaceholderError, offset: usize) -> PlaceholderError {
    let span = err.span();
    let moved = span.start + offset..span.end + offset;
    match err {
        PlaceholderError::CssVar { message, .. } => PlaceholderError::CssVar {
            span: moved,
            message,
        },
        other => other,
    }
}

/// `primary-color` -> `primaryColor`
pub fn camel_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut upper = false;
    for c in token.chars() {
        if c == '-' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Ways to read a token as `group.key`, longest group first
///
/// `shadow-lg-color` -> `[("shadowLg", "color"), ("shadow", "lgColor")]`
pub fn group_splits(token: &str) -> Vec<(String, String)> {
    token
        .match_indices('-')
        .map(|(i, _)| i)
        .filter(|&i| i > 0 && i + 1 < token.len())
        .rev()
        .map(|i| (camel_case(&token[..i]), camel_case(&token[i + 1..])))
        .collect()
}
