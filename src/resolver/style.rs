//! `var(--token)` cascade

use std::collections::BTreeMap;

use crate::model::{StyleValue, StyleVariables};
use crate::placeholder::css_var::{self, camel_case, group_splits, CssPart};
use crate::registry::ComponentDefinition;

/// Fallbacks and custom property values may themselves contain `var()`
const MAX_VAR_DEPTH: usize = 8;

/// Where a `var()` can find its value, nearest first
#[derive(Debug, Clone)]
pub struct StyleScope<'a> {
    variables: &'a StyleVariables,
    /// Inline styles of ancestors and self, outermost first
    inline: Vec<&'a BTreeMap<String, StyleValue>>,
    section: Option<&'a ComponentDefinition>,
    keep_unresolved: bool,
}

impl<'a> StyleScope<'a> {
    pub fn new(variables: &'a StyleVariables) -> Self {
        Self {
            variables,
            inline: Vec::new(),
            section: None,
            keep_unresolved: true,
        }
    }

    pub fn with_keep_unresolved(mut self, keep: bool) -> Self {
        self.keep_unresolved = keep;
        self
    }

    /// Scope for a child node
    pub fn enter(
        &self,
        style: &'a BTreeMap<String, StyleValue>,
        section: Option<&'a ComponentDefinition>,
    ) -> Self {
        let mut inline = self.inline.clone();
        inline.push(style);
        Self {
            variables: self.variables,
            inline,
            section: section.or(self.section),
            keep_unresolved: self.keep_unresolved,
        }
    }

    /// Replace every `var()` in `value`; malformed input is returned unchanged
    pub fn resolve(&self, value: &str) -> String {
        self.resolve_at(value, 0)
    }

    fn resolve_at(&self, value: &str, depth: usize) -> String {
        if depth > MAX_VAR_DEPTH {
            return value.to_string();
        }
        let Ok(parts) = css_var::parse(value) else {
            return value.to_string();
        };

        let mut out = String::with_capacity(value.len());
        for part in parts {
            match part {
                CssPart::Text(text) => out.push_str(&text),
                CssPart::Var(call) => {
                    if let Some(found) = self.lookup(&call.name) {
                        out.push_str(&self.resolve_at(&found, depth + 1));
                    } else if let Some(fallback) = &call.fallback {
                        out.push_str(&self.resolve_at(fallback, depth + 1));
                    } else if self.keep_unresolved {
                        out.push_str(&value[call.span.clone()]);
                    }
                }
            }
        }
        out
    }

    /// Value of custom property `--name`
    pub fn lookup(&self, name: &str) -> Option<String> {
        let property = format!("--{}", name);
        if let Some(v) = self
            .inline
            .iter()
            .rev()
            .find_map(|style| style.get(&property).and_then(StyleValue::as_css))
        {
            return Some(v);
        }

        self.lookup_variable(name)
            .or_else(|| self.section?.style_default(&camel_case(name)))
    }

    fn lookup_variable(&self, name: &str) -> Option<String> {
        let camel = camel_case(name);
        if let Some(v) = [camel.as_str(), name]
            .iter()
            .find_map(|key| self.variables.get(*key).and_then(StyleValue::as_css))
        {
            return Some(v);
        }
        group_splits(name).into_iter().find_map(|(group, key)| {
            self.variables
                .get(&group)
                .and_then(|g| g.get(&key))
                .and_then(StyleValue::as_css)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use pretty_assertions::assert_eq;

    fn vars() -> StyleVariables {
        serde_json::from_str(
            r##"{"primaryColor": "#111111", "shadowLg": {"color": "rgba(0,0,0,0.2)", "blur": 24}}"##,
        )
        .unwrap()
    }

    #[test]
    fn test_literal_fallback() {
        let vars = StyleVariables::new();
        let scope = StyleScope::new(&vars);
        assert_eq!(scope.resolve("var(--primary-color, #3b82f6)"), "#3b82f6");
    }

    #[test]
    fn test_style_variable_wins_over_fallback() {
        let vars = vars();
        let scope = StyleScope::new(&vars);
        assert_eq!(scope.resolve("var(--primary-color, #3b82f6)"), "#111111");
        assert_eq!(
            scope.resolve("0 4px var(--shadow-lg-blur)px var(--shadow-lg-color)"),
            "0 4px 24px rgba(0,0,0,0.2)"
        );
    }

    #[test]
    fn test_inline_custom_property_is_nearest() {
        let vars = vars();
        let mut outer = BTreeMap::new();
        outer.insert("--primary-color".to_string(), StyleValue::from("#222222"));
        let mut inner = BTreeMap::new();
        inner.insert("--primary-color".to_string(), StyleValue::from("#333333"));
        let scope = StyleScope::new(&vars).enter(&outer, None);
        assert_eq!(scope.resolve("var(--primary-color)"), "#222222");
        let scope = scope.enter(&inner, None);
        assert_eq!(scope.resolve("var(--primary-color)"), "#333333");
    }

    #[test]
    fn test_section_default_before_fallback() {
        let vars = StyleVariables::new();
        let style = BTreeMap::new();
        let hero = Registry::builtin().get("hero");
        let scope = StyleScope::new(&vars).enter(&style, hero);
        assert_eq!(scope.resolve("var(--padding, 0)"), "64px 24px");
    }

    #[test]
    fn test_unresolved_kept_or_dropped() {
        let vars = StyleVariables::new();
        let scope = StyleScope::new(&vars);
        assert_eq!(scope.resolve("1px solid var(--border)"), "1px solid var(--border)");
        let scope = scope.with_keep_unresolved(false);
        assert_eq!(scope.resolve("1px solid var(--border)"), "1px solid ");
    }

    #[test]
    fn test_nested_fallback() {
        let vars = StyleVariables::new();
        let scope = StyleScope::new(&vars);
        assert_eq!(scope.resolve("var(--a, var(--b, 12px))"), "12px");
    }

    #[test]
    fn test_malformed_is_verbatim() {
        let vars = StyleVariables::new();
        let scope = StyleScope::new(&vars);
        assert_eq!(scope.resolve("var(--a, #fff"), "var(--a, #fff");
    }
}
