//! Evaluation context for attribute expressions

use super::ast::{Path, Root};
use crate::types::{Attributes, Domain, Resource, Subject};
use serde_json::Value;
use std::borrow::Cow;

/// Entities an expression is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub subject: &'a Subject,
    pub resource: &'a Resource,
    pub domain: Option<&'a Domain>,
}

impl<'a> EvalContext<'a> {
    pub fn new(subject: &'a Subject, resource: &'a Resource, domain: Option<&'a Domain>) -> Self {
        Self {
            subject,
            resource,
            domain,
        }
    }

    /// Resolve a path to a value, or `None` when the attribute is absent.
    ///
    /// Attribute maps shadow the built-in `id` (all roots) and `type`
    /// (resource only) fields.
    pub fn resolve(&self, path: &Path) -> Option<Cow<'a, Value>> {
        let (first, rest) = path.segments.split_first()?;

        let mut current: Cow<'a, Value> = match self.attributes(path.root)?.get(first) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(self.builtin(path.root, first)?),
        };

        for segment in rest {
            current = match current {
                Cow::Borrowed(value) => Cow::Borrowed(value.as_object()?.get(segment)?),
                Cow::Owned(value) => Cow::Owned(value.as_object()?.get(segment)?.clone()),
            };
        }

        Some(current)
    }

    fn attributes(&self, root: Root) -> Option<&'a Attributes> {
        match root {
            Root::Subject => Some(&self.subject.attributes),
            Root::Resource => Some(&self.resource.attributes),
            Root::Domain => self.domain.map(|d| &d.attributes),
        }
    }

    fn builtin(&self, root: Root, name: &str) -> Option<Value> {
        match (root, name) {
            (Root::Subject, "id") => Some(Value::String(self.subject.id.clone())),
            (Root::Resource, "id") => Some(Value::String(self.resource.id.clone())),
            (Root::Resource, "type") => Some(Value::String(self.resource.resource_type.clone())),
            (Root::Domain, "id") => self.domain.map(|d| Value::String(d.id.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(root: Root, segments: &[&str]) -> Path {
        Path {
            root,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolves_attributes_and_builtins() {
        let subject = Subject::new("user:alice").with_attribute("address", json!({"city": "Oslo"}));
        let resource = Resource::new("article:9").with_attribute("author_id", 123);
        let ctx = EvalContext::new(&subject, &resource, None);

        assert_eq!(
            ctx.resolve(&path(Root::Subject, &["address", "city"])).as_deref(),
            Some(&json!("Oslo"))
        );
        assert_eq!(
            ctx.resolve(&path(Root::Subject, &["id"])).as_deref(),
            Some(&json!("user:alice"))
        );
        assert_eq!(
            ctx.resolve(&path(Root::Resource, &["type"])).as_deref(),
            Some(&json!("article"))
        );
        assert_eq!(
            ctx.resolve(&path(Root::Resource, &["author_id"])).as_deref(),
            Some(&json!(123))
        );
    }

    #[test]
    fn test_attribute_shadows_builtin_id() {
        let subject = Subject::new("123").with_attribute("id", 123);
        let resource = Resource::new("article:1");
        let ctx = EvalContext::new(&subject, &resource, None);

        assert_eq!(ctx.resolve(&path(Root::Subject, &["id"])).as_deref(), Some(&json!(123)));
    }

    #[test]
    fn test_missing_paths_are_absent() {
        let subject = Subject::new("user:alice").with_attribute("name", "alice");
        let resource = Resource::new("article:1");
        let ctx = EvalContext::new(&subject, &resource, None);

        assert!(ctx.resolve(&path(Root::Subject, &["missing"])).is_none());
        assert!(ctx.resolve(&path(Root::Subject, &["name", "first"])).is_none());
        assert!(ctx.resolve(&path(Root::Subject, &["type"])).is_none());
        assert!(ctx.resolve(&path(Root::Domain, &["id"])).is_none());
    }

    #[test]
    fn test_domain_values() {
        let subject = Subject::new("user:alice");
        let resource = Resource::new("article:1");
        let domain = Domain::new("tenant-a").with_attribute("tier", "gold");
        let ctx = EvalContext::new(&subject, &resource, Some(&domain));

        assert_eq!(ctx.resolve(&path(Root::Domain, &["id"])).as_deref(), Some(&json!("tenant-a")));
        assert_eq!(ctx.resolve(&path(Root::Domain, &["tier"])).as_deref(), Some(&json!("gold")));
    }
}
