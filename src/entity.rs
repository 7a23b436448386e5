//! Declaration entities - the nodes of the knowledge graph
//!
//! An entity is identified by its [`EntityKey`]. Everything else it carries is an
//! attribute that only ever grows: observing the same entity again merges into
//! the existing node instead of replacing it.

use crate::identity::{EntityKey, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Role an HTTP route plays for the method it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// The method serves the route (Spring request mapping)
    Endpoint,
    /// The method calls the route on another service (Retrofit interface)
    RetrofitClient,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Endpoint => "endpoint",
            RouteKind::RetrofitClient => "retrofit_client",
        }
    }

    /// Local name used for the RDF class of this route kind
    pub fn type_name(&self) -> &'static str {
        match self {
            RouteKind::Endpoint => "Endpoint",
            RouteKind::RetrofitClient => "RetrofitClient",
        }
    }
}

/// An HTTP route attached to a method by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    pub kind: RouteKind,
    /// Upper-case HTTP verb
    pub http_method: String,
    pub paths: BTreeSet<String>,
}

impl Route {
    pub fn new(kind: RouteKind, http_method: impl Into<String>, paths: BTreeSet<String>) -> Self {
        Self {
            kind,
            http_method: http_method.into().to_uppercase(),
            paths,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        write!(f, "{} {}", self.http_method, paths.join(","))
    }
}

/// An SQS event processor configuration bean, identified by its qualifier.
///
/// Produced by `@Bean` factory methods, which know the queue URL, and by
/// processor construction sites, which only know the qualifier they inject.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventConfig {
    pub qualifier: String,
    /// Literal URL, or the `${...}` property placeholder it is read from
    pub queue_url: Option<String>,
}

impl EventConfig {
    pub fn new(qualifier: impl Into<String>, queue_url: Option<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            queue_url,
        }
    }
}

/// A class or method observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: EntityKey,
    /// A declaration was seen, not just a reference from a call site
    pub declared: bool,
    /// Parameter type lists of every declaration sharing this key, e.g. `(int,String)`
    pub parameter_types: BTreeSet<String>,
    /// Relative paths of the files declaring this entity
    pub sources: BTreeSet<String>,
    pub routes: BTreeSet<Route>,
    /// Event processor configurations the method produces or the class consumes
    #[serde(default)]
    pub configs: BTreeSet<EventConfig>,
}

impl Entity {
    /// An entity only known through a reference (call target, instantiated type)
    pub fn referenced(key: EntityKey) -> Self {
        Self {
            key,
            declared: false,
            parameter_types: BTreeSet::new(),
            sources: BTreeSet::new(),
            routes: BTreeSet::new(),
            configs: BTreeSet::new(),
        }
    }

    /// An entity declared in `path`
    pub fn declared(key: EntityKey, path: impl Into<String>) -> Self {
        let mut entity = Self::referenced(key);
        entity.declared = true;
        entity.sources.insert(path.into());
        entity
    }

    /// Record the declared parameter types, e.g. `["int", "String"]`
    pub fn with_parameter_types<S: AsRef<str>>(mut self, types: &[S]) -> Self {
        let joined: Vec<&str> = types.iter().map(AsRef::as_ref).collect();
        self.parameter_types.insert(format!("({})", joined.join(",")));
        self
    }

    pub fn with_routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    pub fn with_configs(mut self, configs: impl IntoIterator<Item = EventConfig>) -> Self {
        self.configs.extend(configs);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.key.kind
    }

    /// Fold another observation of the same entity into this one.
    ///
    /// Every attribute is a flag that can only turn on or a set that can only
    /// grow, so the result does not depend on observation order.
    pub fn merge(&mut self, other: &Entity) {
        debug_assert_eq!(self.key, other.key);
        self.declared |= other.declared;
        self.parameter_types
            .extend(other.parameter_types.iter().cloned());
        self.sources.extend(other.sources.iter().cloned());
        self.routes.extend(other.routes.iter().cloned());
        self.configs.extend(other.configs.iter().cloned());
    }
}

impl std::hash::Hash for Entity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_order_independent() {
        let key = EntityKey::method("com.acme.B", "bar", 1);
        let referenced = Entity::referenced(key.clone());
        let declared = Entity::declared(key.clone(), "src/B.java").with_parameter_types(&["int"]);

        let mut first = referenced.clone();
        first.merge(&declared);
        let mut second = declared.clone();
        second.merge(&referenced);

        assert_eq!(first, second);
        assert!(first.declared);
        assert!(first.parameter_types.contains("(int)"));
        assert!(first.sources.contains("src/B.java"));
    }

    #[test]
    fn test_overloads_accumulate_parameter_types() {
        let key = EntityKey::method("com.acme.B", "bar", 1);
        let mut entity = Entity::declared(key.clone(), "B.java").with_parameter_types(&["int"]);
        entity.merge(&Entity::declared(key, "B.java").with_parameter_types(&["String"]));

        assert_eq!(entity.parameter_types.len(), 2);
        assert_eq!(entity.sources.len(), 1);
    }

    #[test]
    fn test_configs_accumulate() {
        let key = EntityKey::class("com.acme.MyEventHandler");
        let mut entity = Entity::declared(key.clone(), "MyEventHandler.kt");
        entity.merge(&Entity::referenced(key).with_configs([EventConfig::new("myEventConfig", None)]));

        assert!(entity.declared);
        assert_eq!(entity.configs.len(), 1);
        assert_eq!(entity.configs.iter().next().unwrap().qualifier, "myEventConfig");
    }

    #[test]
    fn test_route_normalizes_verb() {
        let route = Route::new(RouteKind::Endpoint, "get", BTreeSet::from(["/v1/x".to_string()]));
        assert_eq!(route.http_method, "GET");
        assert_eq!(route.to_string(), "GET /v1/x");
    }
}
