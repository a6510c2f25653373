//! Content context and lookup scopes for placeholder resolution

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::placeholder::{Path, PathSegment};

/// Product and seller data placeholders are resolved against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentContext {
    pub content: Value,
    pub images: Vec<String>,
}

impl ContentContext {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            images: Vec::new(),
        }
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a bare content object
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

/// Lookup scope: the content context plus the `item`/`index` bindings of
/// enclosing directive clones, innermost last
#[derive(Debug, Clone)]
pub struct ResolutionScope<'a> {
    ctx: &'a ContentContext,
    bindings: Vec<(Value, usize)>,
    id_suffix: String,
}

impl<'a> ResolutionScope<'a> {
    pub fn new(ctx: &'a ContentContext) -> Self {
        Self {
            ctx,
            bindings: Vec::new(),
            id_suffix: String::new(),
        }
    }

    /// Scope for clone `index` of a directive over `item`
    pub fn nested(&self, item: Value, index: usize) -> Self {
        let mut bindings = self.bindings.clone();
        bindings.push((item, index));
        Self {
            ctx: self.ctx,
            bindings,
            id_suffix: format!("{}-{}", self.id_suffix, index),
        }
    }

    /// Node id as it appears in this scope
    pub fn scoped_id(&self, id: &str) -> String {
        format!("{}{}", id, self.id_suffix)
    }

    pub fn lookup(&self, path: &Path) -> Option<Value> {
        let root = path.root()?;
        let rest = path.rest();
        match root {
            "content" => walk(&self.ctx.content, rest).cloned(),
            "images" => self.lookup_image(rest),
            "item" if !self.bindings.is_empty() => {
                let (item, _) = self.bindings.last()?;
                walk(item, rest).cloned()
            }
            "index" if !self.bindings.is_empty() => {
                let (_, index) = self.bindings.last()?;
                rest.is_empty().then(|| Value::from(*index))
            }
            _ => self
                .bindings
                .last()
                .and_then(|(item, _)| walk(item, path.segments()))
                .or_else(|| walk(&self.ctx.content, path.segments()))
                .cloned(),
        }
    }

    fn lookup_image(&self, rest: &[PathSegment]) -> Option<Value> {
        match rest {
            [] => Some(Value::from(self.ctx.images.clone())),
            [PathSegment::Index(n)] => self.ctx.images.get(*n).map(|s| Value::from(s.as_str())),
            _ => None,
        }
    }
}

fn walk<'v>(mut value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    for segment in segments {
        value = match segment {
            PathSegment::Key(k) => value.as_object()?.get(k)?,
            PathSegment::Index(n) => value.as_array()?.get(*n)?,
        };
    }
    Some(value)
}

/// Text form of a looked-up value
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::parse_expr;
    use serde_json::json;

    fn path(s: &str) -> Path {
        parse_expr(s, 0).unwrap().path
    }

    fn ctx() -> ContentContext {
        ContentContext::new(json!({
            "basics": {"name": "Desk Lamp", "price": 49.5},
            "title": "from content",
            "features": [{"title": "Bright"}, {"title": "Dimmable"}]
        }))
        .with_images(["a.jpg", "b.jpg"])
    }

    #[test]
    fn test_content_and_images() {
        let ctx = ctx();
        let scope = ResolutionScope::new(&ctx);
        assert_eq!(scope.lookup(&path("content.basics.name")), Some(json!("Desk Lamp")));
        assert_eq!(scope.lookup(&path("content.features[1].title")), Some(json!("Dimmable")));
        assert_eq!(scope.lookup(&path("images[1]")), Some(json!("b.jpg")));
        assert_eq!(scope.lookup(&path("images[5]")), None);
        assert_eq!(scope.lookup(&path("content.missing.deep")), None);
    }

    #[test]
    fn test_item_scope_and_fallback_root() {
        let ctx = ctx();
        let scope = ResolutionScope::new(&ctx).nested(json!({"title": "Bright"}), 0);
        assert_eq!(scope.lookup(&path("item.title")), Some(json!("Bright")));
        assert_eq!(scope.lookup(&path("index")), Some(json!(0)));
        // bare roots try the item first, then content
        assert_eq!(scope.lookup(&path("title")), Some(json!("Bright")));
        assert_eq!(scope.lookup(&path("basics.name")), Some(json!("Desk Lamp")));
    }

    #[test]
    fn test_nested_ids() {
        let ctx = ctx();
        let inner = ResolutionScope::new(&ctx).nested(json!(1), 0).nested(json!(2), 1);
        assert_eq!(inner.scoped_id("item"), "item-0-1");
        assert_eq!(inner.lookup(&path("item")), Some(json!(2)));
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("x")), "x");
        assert_eq!(stringify(&json!(49.5)), "49.5");
        assert_eq!(stringify(&json!(3)), "3");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!([1])), "");
    }
}
