//! Core authorization value objects

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Dynamic attribute map attached to subjects, resources and domains
pub type Attributes = HashMap<String, Value>;

/// Attribute holding the subject's role list
pub const ROLES_ATTRIBUTE: &str = "roles";

/// Attribute holding the subject's per-domain role lists (`{domain_id: [roles]}`)
pub const DOMAIN_ROLES_ATTRIBUTE: &str = "domain_roles";

/// Subject (user, service account, agent) requesting access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Subject identifier (e.g., "user:alice", "123")
    pub id: String,

    /// Additional attributes (e.g., roles, department, clearance)
    #[serde(default)]
    pub attributes: Attributes,
}

impl Subject {
    /// Create a new subject from an ID string
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the subject
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the subject's role list
    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<Value> = roles.into_iter().map(|r| Value::String(r.into())).collect();
        self.with_attribute(ROLES_ATTRIBUTE, Value::Array(roles))
    }

    /// Global roles from the `roles` attribute (non-string entries are ignored)
    pub fn roles(&self) -> Vec<&str> {
        string_list(self.attributes.get(ROLES_ATTRIBUTE))
    }

    /// Roles granted inside a single domain via the `domain_roles` attribute
    pub fn domain_roles(&self, domain_id: &str) -> Vec<&str> {
        let per_domain = self
            .attributes
            .get(DOMAIN_ROLES_ATTRIBUTE)
            .and_then(Value::as_object)
            .and_then(|m| m.get(domain_id));
        string_list(per_domain)
    }
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(single)) => vec![single.as_str()],
        _ => Vec::new(),
    }
}

/// Resource being accessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier (e.g., "document:123", "/api/users/42")
    pub id: String,

    /// Resource type (document, post, api, etc.)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Additional attributes (e.g., owner_id, status)
    #[serde(default)]
    pub attributes: Attributes,
}

impl Resource {
    /// Create a new resource from an ID string.
    ///
    /// The type is taken from the text before the first `:`, falling back to
    /// `"resource"` for ids without a type prefix.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let resource_type = match id.split_once(':') {
            Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
            _ => "resource".to_string(),
        };

        Self {
            id,
            resource_type,
            attributes: HashMap::new(),
        }
    }

    /// Create a resource with an explicit type
    pub fn typed(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the resource
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Action being performed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action name (read, edit, GET, POST, etc.)
    pub name: String,
}

impl Action {
    /// Create a new action
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Tenant or namespace the request is evaluated in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain identifier (e.g., "tenant-a")
    pub id: String,

    #[serde(default)]
    pub attributes: Attributes,
}

impl Domain {
    /// Create a new domain
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute to the domain
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}
