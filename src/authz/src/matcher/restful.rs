//! RESTful path and HTTP method matching

use dashmap::DashMap;
use regex::Regex;
use std::sync::Arc;
use tracing::warn;

use super::RuleMatcher;
use crate::pattern;
use crate::policy::PolicyRule;
use crate::types::{Action, Domain, Resource, Subject};

/// Matches path templates and HTTP methods
///
/// Template segments:
/// - `:name` matches exactly one path segment
/// - `*` matches one or more segments
/// - anything else must be equal
///
/// The rule action must equal the request method exactly (case-sensitive,
/// no wildcards). Query strings on the request path are ignored. Compiled
/// templates are cached per template string.
#[derive(Debug, Default)]
pub struct RestfulMatcher {
    /// Compiled template cache (thread-safe)
    routes: Arc<DashMap<String, Arc<Regex>>>,
}

impl RestfulMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a request path against a template
    pub fn matches_path(&self, template: &str, path: &str) -> bool {
        if template == pattern::WILDCARD {
            return true;
        }

        let path = path.split('?').next().unwrap_or(path);

        match self.compile(template) {
            Ok(route) => route.is_match(path),
            Err(e) => {
                warn!("Skipping unusable path template '{}': {}", template, e);
                false
            }
        }
    }

    fn compile(&self, template: &str) -> Result<Arc<Regex>, regex::Error> {
        if let Some(route) = self.routes.get(template) {
            return Ok(route.clone());
        }

        let route = Arc::new(Regex::new(&template_to_regex(template))?);
        self.routes.insert(template.to_string(), route.clone());
        Ok(route)
    }
}

fn template_to_regex(template: &str) -> String {
    let segments: Vec<String> = template
        .split('/')
        .map(|segment| match segment {
            "*" => "[^/]+(?:/[^/]+)*".to_string(),
            s if s.len() > 1 && s.starts_with(':') => "[^/]+".to_string(),
            s => regex::escape(s),
        })
        .collect();

    format!("^{}$", segments.join("/"))
}

impl RuleMatcher for RestfulMatcher {
    fn matches(
        &self,
        rule: &PolicyRule,
        subject: &Subject,
        resource: &Resource,
        action: &Action,
        domain: Option<&Domain>,
    ) -> bool {
        rule.action() == action.name
            && pattern::matches_pattern(rule.subject(), &subject.id)
            && rule.matches_domain(domain)
            && rule.resource().map_or(true, |template| self.matches_path(template, &resource.id))
    }

    fn name(&self) -> &str {
        "restful"
    }
}
