//! Turtle export of a finished knowledge model
//!
//! Individuals are named `<data_ns><Class>#<uuid>`, where the UUID is a v3
//! (URL namespace) hash of the identity elements joined with `#`. The same
//! entity therefore gets the same IRI across runs and machines.

pub mod reader;
pub mod turtle;

pub use reader::TurtleReader;
pub use turtle::TurtleWriter;

use crate::entity::{EventConfig, Route};
use crate::identity::EntityKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ONTOLOGY_NAMESPACE: &str = "http://yourorg.com/ontology/";
pub const DEFAULT_DATA_NAMESPACE: &str = "http://yourorg.com/data/";

pub const CONFIG_TYPE: &str = "EventProcessorConfiguration";

pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Namespaces of the emitted vocabulary and individuals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespaces {
    /// Classes and properties (`tbox:` prefix)
    pub ontology: String,
    /// Individuals
    pub data: String,
}

impl Default for Namespaces {
    fn default() -> Self {
        Self {
            ontology: DEFAULT_ONTOLOGY_NAMESPACE.to_string(),
            data: DEFAULT_DATA_NAMESPACE.to_string(),
        }
    }
}

impl Namespaces {
    pub fn new(ontology: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            ontology: ontology.into(),
            data: data.into(),
        }
    }

    /// IRI of an individual of `class_name` identified by `elements`
    pub fn individual(&self, class_name: &str, elements: &[&str]) -> String {
        let name = elements.join("#");
        let id = Uuid::new_v3(&Uuid::NAMESPACE_URL, name.as_bytes());
        format!("{}{}#{}", self.data, class_name, id)
    }

    /// IRI of a class or method node
    pub fn entity(&self, key: &EntityKey) -> String {
        self.individual(key.kind.type_name(), &[&key.to_key_string()])
    }

    /// IRI of a route. Routes with the same verb and paths share one individual.
    pub fn route(&self, route: &Route) -> String {
        let mut elements = vec![route.http_method.as_str()];
        elements.extend(route.paths.iter().map(String::as_str));
        self.individual(route.kind.type_name(), &elements)
    }

    /// IRI of an event processor configuration. A producer that knows the queue
    /// URL and a consumer that only knows the qualifier get distinct individuals.
    pub fn config(&self, config: &EventConfig) -> String {
        let mut elements = vec![config.qualifier.as_str()];
        elements.extend(config.queue_url.as_deref());
        self.individual(CONFIG_TYPE, &elements)
    }
}

/// Escape a string for a Turtle short string literal
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_literal`]. Returns `None` on a dangling or unknown escape.
pub fn unescape_literal(value: &str) -> Option<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            '\\' => '\\',
            '"' => '"',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            _ => return None,
        });
    }
    Some(out)
}
