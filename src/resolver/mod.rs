//! Placeholder resolution - turns a document plus content into a render tree
//!
//! Resolution is pure: the same document and content always produce the same
//! [`ResolvedTree`]. Lookups that miss become empty text, and tokens that do
//! not parse are emitted as written.

mod context;
mod style;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

pub use context::{stringify, ContentContext, ResolutionScope};
pub use style::StyleScope;

use crate::model::{Animation, Child, Document, Metadata, Node, StyleValue};
use crate::placeholder::{self, Segment};
use crate::registry::Registry;
use crate::validator::{is_script_url, URL_ATTRIBUTES};

/// Fully substituted page, ready for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTree {
    pub metadata: Metadata,
    pub animations: BTreeMap<String, Animation>,
    pub root: ResolvedNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub style: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, Value>,
    pub children: Vec<ResolvedChild>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedChild {
    Node(ResolvedNode),
    Text(String),
}

impl ResolvedChild {
    pub fn as_node(&self) -> Option<&ResolvedNode> {
        match self {
            ResolvedChild::Node(n) => Some(n),
            ResolvedChild::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResolvedChild::Text(s) => Some(s.as_str()),
            ResolvedChild::Node(_) => None,
        }
    }
}

impl ResolvedNode {
    pub fn find(&self, id: &str) -> Option<&ResolvedNode> {
        if self.id == id {
            return Some(self);
        }
        self.child_nodes().find_map(|c| c.find(id))
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.children.iter().filter_map(ResolvedChild::as_node)
    }

    /// Concatenated text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(ResolvedChild::as_text)
            .collect()
    }
}

impl ResolvedTree {
    pub fn find(&self, id: &str) -> Option<&ResolvedNode> {
        self.root.find(id)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Resolver bound to a registry
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'r> {
    registry: &'r Registry,
    keep_unresolved_vars: bool,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            keep_unresolved_vars: true,
        }
    }

    /// Whether a `var()` with no value and no fallback stays in the output
    pub fn with_keep_unresolved_vars(mut self, keep: bool) -> Self {
        self.keep_unresolved_vars = keep;
        self
    }

    pub fn resolve(&self, doc: &Document, ctx: &ContentContext) -> ResolvedTree {
        let scope = ResolutionScope::new(ctx);
        let styles =
            StyleScope::new(&doc.style_variables).with_keep_unresolved(self.keep_unresolved_vars);
        let root = self.resolve_node(&doc.component, &scope, &styles);
        tracing::debug!(
            template = %doc.metadata.template,
            images = ctx.images.len(),
            "resolved document"
        );
        ResolvedTree {
            metadata: doc.metadata.clone(),
            animations: doc.animations.clone(),
            root,
        }
    }

    fn resolve_node<'a>(
        &self,
        node: &'a Node,
        scope: &ResolutionScope<'_>,
        styles: &StyleScope<'a>,
    ) -> ResolvedNode
    where
        'r: 'a,
    {
        let section = node
            .section_type
            .as_deref()
            .and_then(|s| self.registry.get(s));
        let styles = styles.enter(&node.props.style, section);

        let style = node
            .props
            .style
            .iter()
            .filter_map(|(property, value)| {
                let css = match value {
                    StyleValue::Text(s) => styles.resolve(&substitute(s, scope)),
                    StyleValue::Number(n) => n.to_string(),
                    StyleValue::Group(_) => return None,
                };
                Some((property.clone(), css))
            })
            .collect();

        let attributes = node
            .props
            .attributes
            .iter()
            .map(|(name, value)| {
                let resolved = match value {
                    Value::String(s) => Value::String(safe_attribute(name, substitute(s, scope))),
                    other => other.clone(),
                };
                (name.clone(), resolved)
            })
            .collect();

        ResolvedNode {
            id: scope.scoped_id(&node.id),
            kind: node.kind.clone(),
            section_type: node.section_type.clone(),
            class_name: node.props.class_name.as_deref().map(|c| substitute(c, scope)),
            style,
            attributes,
            children: self.resolve_children(&node.children, scope, &styles),
        }
    }

    fn resolve_children<'a>(
        &self,
        children: &'a [Child],
        scope: &ResolutionScope<'_>,
        styles: &StyleScope<'a>,
    ) -> Vec<ResolvedChild>
    where
        'r: 'a,
    {
        let mut out = Vec::with_capacity(children.len());
        let mut i = 0;
        while i < children.len() {
            match &children[i] {
                Child::Node(node) => out.push(ResolvedChild::Node(self.resolve_node(node, scope, styles))),
                Child::Text(text) => match (placeholder::as_directive(text), children.get(i + 1)) {
                    (Some(source), Some(Child::Node(template))) => {
                        if let Some(Value::Array(items)) = scope.lookup(&source) {
                            for (index, item) in items.into_iter().enumerate() {
                                let clone_scope = scope.nested(item, index);
                                out.push(ResolvedChild::Node(
                                    self.resolve_node(template, &clone_scope, styles),
                                ));
                            }
                        }
                        i += 1;
                    }
                    _ => out.push(ResolvedChild::Text(substitute(text, scope))),
                },
            }
            i += 1;
        }
        out
    }
}

/// Replace every placeholder in `text`
///
/// Directives inside mixed text and strings that do not parse are kept as
/// written.
pub fn substitute(text: &str, scope: &ResolutionScope<'_>) -> String {
    let Ok(segments) = placeholder::segments(text) else {
        return text.to_string();
    };
    let mut out = String::with_capacity(text.len());
    for segment in segments {
        match segment {
            Segment::Literal(s) => out.push_str(&s),
            Segment::Placeholder(expr) => {
                let value = scope.lookup(&expr.path);
                let missing = matches!(&value, None | Some(Value::Null))
                    || matches!(&value, Some(Value::String(s)) if s.is_empty());
                match (&expr.default, missing) {
                    (Some(default), true) => out.push_str(default),
                    _ => out.push_str(&value.as_ref().map(stringify).unwrap_or_default()),
                }
            }
            Segment::Directive { span, .. } => out.push_str(&text[span]),
        }
    }
    out
}

/// Content may not turn a URL attribute into a script URL
fn safe_attribute(name: &str, value: String) -> String {
    if URL_ATTRIBUTES.contains(&name) && is_script_url(&value) {
        tracing::warn!(attribute = name, "dropped script URL from resolved content");
        return String::new();
    }
    value
}

/// Resolve with default options
pub fn resolve(doc: &Document, ctx: &ContentContext, registry: &Registry) -> ResolvedTree {
    Resolver::new(registry).resolve(doc, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::set_style_variable;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn hero_doc() -> Document {
        let mut hero = Registry::builtin().get("hero").unwrap().template.clone();
        hero.id = "hero".into();
        Document::new(Node::new("page", "main").with_child(hero))
    }

    #[test]
    fn test_default_when_missing() {
        let tree = resolve(&hero_doc(), &ContentContext::default(), Registry::builtin());
        assert_eq!(tree.find("hero-title").unwrap().text(), "Amazing Product");
    }

    #[test]
    fn test_value_when_present() {
        let ctx = ContentContext::new(json!({"basics": {"name": "Desk Lamp"}}));
        let tree = resolve(&hero_doc(), &ctx, Registry::builtin());
        assert_eq!(tree.find("hero-title").unwrap().text(), "Desk Lamp");
    }

    #[test]
    fn test_empty_string_takes_default() {
        let ctx = ContentContext::new(json!({"basics": {"name": ""}}));
        let tree = resolve(&hero_doc(), &ctx, Registry::builtin());
        assert_eq!(tree.find("hero-title").unwrap().text(), "Amazing Product");
    }

    #[test]
    fn test_style_variable_changes_resolution() {
        let registry = Registry::builtin();
        let doc = hero_doc();
        let ctx = ContentContext::default();
        let before = resolve(&doc, &ctx, registry);
        assert_eq!(before.find("hero-cta").unwrap().style["backgroundColor"], "#3b82f6");

        let doc = set_style_variable(&doc, "primaryColor", "#111111");
        let after = resolve(&doc, &ctx, registry);
        assert_eq!(after.find("hero-cta").unwrap().style["backgroundColor"], "#111111");
    }

    #[test]
    fn test_images_and_missing_index() {
        let ctx = ContentContext::default().with_images(["front.jpg"]);
        let tree = resolve(&hero_doc(), &ctx, Registry::builtin());
        assert_eq!(tree.find("hero-image").unwrap().attributes["src"], json!("front.jpg"));

        let tree = resolve(&hero_doc(), &ContentContext::default(), Registry::builtin());
        assert_eq!(tree.find("hero-image").unwrap().attributes["src"], json!(""));
    }

    #[test]
    fn test_directive_expansion() {
        let doc = Document::new(
            Node::new("list", "ul").with_child("{{content.items.map}}").with_child(
                Node::new("item", "li")
                    .with_child("{{index}}: {{item.name}}")
                    .with_child("{{item.tags.map}}")
                    .with_child(Node::new("tag", "span").with_child("{{item}}")),
            ),
        );
        let ctx = ContentContext::new(json!({"items": [
            {"name": "a", "tags": ["x", "y"]},
            {"name": "b"}
        ]}));
        let tree = resolve(&doc, &ctx, Registry::builtin());
        let ids: Vec<_> = tree.root.child_nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["item-0", "item-1"]);

        let first = tree.find("item-0").unwrap();
        assert_eq!(first.text(), "0: a");
        let tags: Vec<_> = first.child_nodes().map(|n| (n.id.as_str(), n.text())).collect();
        assert_eq!(
            tags,
            vec![("tag-0-0", "x".to_string()), ("tag-0-1", "y".to_string())]
        );
        assert_eq!(tree.find("item-1").unwrap().child_nodes().count(), 0);
    }

    #[test]
    fn test_empty_array_yields_no_clones() {
        let doc = Document::new(
            Node::new("list", "ul")
                .with_child("{{content.items.map}}")
                .with_child(Node::new("item", "li")),
        );
        for content in [json!({"items": []}), json!({}), json!({"items": "nope"})] {
            let tree = resolve(&doc, &ContentContext::new(content), Registry::builtin());
            assert!(tree.root.children.is_empty());
        }
    }

    #[test]
    fn test_malformed_tokens_are_verbatim() {
        let doc = Document::new(
            Node::new("p", "p")
                .with_child("Hello {{content.name")
                .with_child("{{content.items.filter}}")
                .with_style("color", "var(--c, #fff"),
        );
        let tree = resolve(&doc, &ContentContext::default(), Registry::builtin());
        assert_eq!(tree.root.text(), "Hello {{content.name{{content.items.filter}}");
        assert_eq!(tree.root.style["color"], "var(--c, #fff");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = Registry::builtin();
        let doc = registry.new_document("product-modern").unwrap();
        let ctx = ContentContext::new(json!({"features": [{"title": "t"}]})).with_images(["a", "b"]);
        let a = serde_json::to_string(&resolve(&doc, &ctx, registry)).unwrap();
        let b = serde_json::to_string(&resolve(&doc, &ctx, registry)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_cannot_inject_script_urls() {
        let doc = Document::new(
            Node::new("buy", "a")
                .with_attribute("href", "{{content.link}}")
                .with_attribute("title", "{{content.link}}"),
        );
        let ctx = ContentContext::new(json!({"link": " JavaScript:alert(1)"}));
        let tree = resolve(&doc, &ctx, Registry::builtin());
        assert_eq!(tree.root.attributes["href"], json!(""));
        assert_eq!(tree.root.attributes["title"], json!(" JavaScript:alert(1)"));

        let ctx = ContentContext::new(json!({"link": "https://shop.example/buy"}));
        let tree = resolve(&doc, &ctx, Registry::builtin());
        assert_eq!(tree.root.attributes["href"], json!("https://shop.example/buy"));
    }

    #[test]
    fn test_number_and_bool_stringify() {
        let doc = Document::new(
            Node::new("p", "p").with_child("{{content.price}} / {{content.inStock}}"),
        );
        let ctx = ContentContext::new(json!({"price": 9.99, "inStock": false}));
        let tree = resolve(&doc, &ctx, Registry::builtin());
        insta::assert_snapshot!(tree.root.text(), @"9.99 / false");
    }
}
