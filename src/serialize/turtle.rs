//! Turtle writer
//!
//! Output layout, one triple per line:
//! 1. Prefix declarations
//! 2. One block per node, in key order
//! 3. One block per route individual, in IRI order
//! 4. One block per event processor configuration, in IRI order
//! 5. Edge triples in snapshot order, each low-confidence edge followed by its
//!    reification

use super::{escape_literal, Namespaces, CONFIG_TYPE, RDF_NAMESPACE, XSD_NAMESPACE};
use crate::edge::{Confidence, Edge, EdgeKind};
use crate::entity::{Entity, EventConfig, Route, RouteKind};
use crate::identity::EntityKind;
use crate::model::Snapshot;
use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Predicate local name of an edge kind
pub fn edge_predicate(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Calls => "calls",
        EdgeKind::Instantiates => "instantiates",
    }
}

/// Predicate local name linking a method to a route of `kind`
pub fn route_predicate(kind: RouteKind) -> &'static str {
    match kind {
        RouteKind::Endpoint => "hasEndpoint",
        RouteKind::RetrofitClient => "isRetrofitClient",
    }
}

/// Renders snapshots as Turtle
#[derive(Debug, Clone, Default)]
pub struct TurtleWriter {
    namespaces: Namespaces,
}

impl TurtleWriter {
    pub fn new(namespaces: Namespaces) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Render a snapshot. The same snapshot always renders to the same text.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        let mut out = String::new();
        push_triple(&mut out, "@prefix", "rdf:", &format!("<{}>", RDF_NAMESPACE));
        push_triple(&mut out, "@prefix", "xsd:", &format!("<{}>", XSD_NAMESPACE));
        push_triple(&mut out, "@prefix", "tbox:", &format!("<{}>", self.namespaces.ontology));

        let mut linked = Linked::default();
        for node in &snapshot.nodes {
            out.push('\n');
            self.render_node(&mut out, node, &mut linked);
        }
        for (iri, route) in &linked.routes {
            out.push('\n');
            self.render_route(&mut out, iri, route);
        }
        for (iri, config) in &linked.configs {
            out.push('\n');
            self.render_config(&mut out, iri, config);
        }

        if !snapshot.edges.is_empty() {
            out.push('\n');
        }
        let mut reified = 0usize;
        for edge in &snapshot.edges {
            self.render_edge(&mut out, edge, &mut reified);
        }
        out
    }

    /// Render and write in one blocking call.
    pub fn write_to_file(&self, snapshot: &Snapshot, path: &Path) -> Result<()> {
        let text = self.render(snapshot);
        std::fs::write(path, text.as_bytes())?;
        info!(
            "Wrote {} nodes and {} edges to {}",
            snapshot.nodes.len(),
            snapshot.edges.len(),
            path.display()
        );
        Ok(())
    }

    fn render_node<'s>(&self, out: &mut String, node: &'s Entity, linked: &mut Linked<'s>) {
        let subject = format!("<{}>", self.namespaces.entity(&node.key));
        let key = &node.key;
        let mut triple = |predicate: &str, object: String| push_triple(out, &subject, predicate, &object);

        triple("rdf:type", format!("tbox:{}", key.kind.type_name()));
        triple("tbox:hasIdentity", literal(&key.to_key_string()));
        match key.kind {
            EntityKind::Class => {
                triple("tbox:hasFullyQualifiedClassName", literal(&key.qualified_name));
                triple("tbox:hasSimpleName", literal(key.simple_name()));
            }
            EntityKind::Method => {
                triple("tbox:hasMethodName", literal(key.simple_name()));
                if let Some(owner) = key.owner() {
                    triple("tbox:hasFullyQualifiedClassName", literal(owner));
                }
                if let Some(arity) = key.signature {
                    triple("tbox:hasArity", format!("\"{}\"^^xsd:integer", arity));
                }
            }
        }
        for types in &node.parameter_types {
            triple("tbox:hasParameterTypes", literal(types));
        }
        triple("tbox:isDeclared", format!("\"{}\"^^xsd:boolean", node.declared));
        for source in &node.sources {
            triple("tbox:declaredIn", literal(source));
        }
        for route in &node.routes {
            let iri = self.namespaces.route(route);
            triple(&format!("tbox:{}", route_predicate(route.kind)), format!("<{}>", iri));
            linked.routes.insert(iri, route);
        }
        for config in &node.configs {
            let iri = self.namespaces.config(config);
            triple("tbox:hasConfig", format!("<{}>", iri));
            linked.configs.insert(iri, config);
        }
    }

    fn render_route(&self, out: &mut String, iri: &str, route: &Route) {
        let subject = format!("<{}>", iri);
        push_triple(out, &subject, "rdf:type", &format!("tbox:{}", route.kind.type_name()));
        push_triple(out, &subject, "tbox:hasHttpMethod", &literal(&route.http_method));
        for path in &route.paths {
            push_triple(out, &subject, "tbox:hasPath", &literal(path));
        }
    }

    fn render_config(&self, out: &mut String, iri: &str, config: &EventConfig) {
        let subject = format!("<{}>", iri);
        push_triple(out, &subject, "rdf:type", &format!("tbox:{}", CONFIG_TYPE));
        push_triple(out, &subject, "tbox:hasQualifier", &literal(&config.qualifier));
        if let Some(url) = &config.queue_url {
            push_triple(out, &subject, "tbox:hasQueueURL", &literal(url));
        }
    }

    fn render_edge(&self, out: &mut String, edge: &Edge, reified: &mut usize) {
        let source = self.namespaces.entity(&edge.source);
        let target = self.namespaces.entity(&edge.target);
        let predicate = format!("tbox:{}", edge_predicate(edge.kind));
        push_triple(out, &format!("<{}>", source), &predicate, &format!("<{}>", target));

        if edge.confidence == Confidence::Low {
            *reified += 1;
            let node = format!("_:low{}", reified);
            push_triple(out, &node, "rdf:type", "rdf:Statement");
            push_triple(out, &node, "rdf:subject", &format!("<{}>", source));
            push_triple(out, &node, "rdf:predicate", &predicate);
            push_triple(out, &node, "rdf:object", &format!("<{}>", target));
            push_triple(out, &node, "tbox:hasConfidence", "\"low\"");
        }
    }
}

/// Individuals linked from node blocks, rendered after them
#[derive(Default)]
struct Linked<'s> {
    routes: BTreeMap<String, &'s Route>,
    configs: BTreeMap<String, &'s EventConfig>,
}

/// Append `subject predicate object .` as one line
fn push_triple(out: &mut String, subject: &str, predicate: &str, object: &str) {
    for term in [subject, " ", predicate, " ", object, " .\n"] {
        out.push_str(term);
    }
}

fn literal(value: &str) -> String {
    format!("\"{}\"", escape_literal(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::EntityKey;
    use std::collections::BTreeSet;

    fn sample() -> Snapshot {
        let route = Route::new(RouteKind::Endpoint, "GET", BTreeSet::from(["/v1/x".to_string()]));
        let foo = Entity::declared(EntityKey::method("com.acme.A", "foo", 0), "src/A.java")
            .with_parameter_types::<&str>(&[])
            .with_routes([route])
            .with_configs([EventConfig::new("ordersConfig", Some("${sqs.orders}".into()))]);
        let nodes = vec![
            Entity::declared(EntityKey::class("com.acme.A"), "src/A.java"),
            foo,
            Entity::referenced(EntityKey::method("com.acme.B", "bar", 0)),
            Entity::referenced(EntityKey::unresolved_method("total", 2)),
        ];
        let edges = vec![
            Edge::new(
                EntityKey::method("com.acme.A", "foo", 0),
                EntityKey::method("com.acme.B", "bar", 0),
                EdgeKind::Calls,
            ),
            Edge::with_confidence(
                EntityKey::method("com.acme.A", "foo", 0),
                EntityKey::unresolved_method("total", 2),
                EdgeKind::Calls,
                Confidence::Low,
            ),
        ];
        Snapshot::from_parts(nodes, edges)
    }

    #[test]
    fn test_render_is_deterministic() {
        let writer = TurtleWriter::default();
        let snapshot = sample();
        assert_eq!(writer.render(&snapshot), writer.render(&snapshot.clone()));
    }

    #[test]
    fn test_render_vocabulary() {
        let writer = TurtleWriter::default();
        let ns = writer.namespaces().clone();
        let text = writer.render(&sample());

        assert!(text.starts_with("@prefix rdf: "));
        assert!(text.contains("@prefix tbox: <http://yourorg.com/ontology/> ."));

        let foo = ns.entity(&EntityKey::method("com.acme.A", "foo", 0));
        let bar = ns.entity(&EntityKey::method("com.acme.B", "bar", 0));
        assert!(text.contains(&format!("<{}> rdf:type tbox:Method .", foo)));
        assert!(text.contains(&format!("<{}> tbox:hasIdentity \"method:com.acme.A.foo(0)\" .", foo)));
        assert!(text.contains(&format!("<{}> tbox:hasMethodName \"foo\" .", foo)));
        assert!(text.contains(&format!("<{}> tbox:hasArity \"0\"^^xsd:integer .", foo)));
        assert!(text.contains(&format!("<{}> tbox:hasParameterTypes \"()\" .", foo)));
        assert!(text.contains(&format!("<{}> tbox:calls <{}> .", foo, bar)));
        assert!(text.contains("tbox:hasHttpMethod \"GET\" ."));
        assert!(text.contains("tbox:hasPath \"/v1/x\" ."));
        assert!(text.contains("rdf:type tbox:Endpoint ."));
    }

    #[test]
    fn test_render_event_configs() {
        let writer = TurtleWriter::default();
        let ns = writer.namespaces().clone();
        let text = writer.render(&sample());

        let foo = ns.entity(&EntityKey::method("com.acme.A", "foo", 0));
        let config = ns.config(&EventConfig::new("ordersConfig", Some("${sqs.orders}".into())));
        assert!(config.starts_with("http://yourorg.com/data/EventProcessorConfiguration#"));
        assert!(text.contains(&format!("<{}> tbox:hasConfig <{}> .", foo, config)));
        assert!(text.contains(&format!("<{}> rdf:type tbox:EventProcessorConfiguration .", config)));
        assert!(text.contains(&format!("<{}> tbox:hasQualifier \"ordersConfig\" .", config)));
        assert!(text.contains(&format!("<{}> tbox:hasQueueURL \"${{sqs.orders}}\" .", config)));
        assert_ne!(config, ns.config(&EventConfig::new("ordersConfig", None)));
    }

    #[test]
    fn test_low_confidence_edges_are_reified() {
        let text = TurtleWriter::default().render(&sample());
        assert_eq!(text.matches("rdf:type rdf:Statement").count(), 1);
        assert!(text.contains("_:low1 tbox:hasConfidence \"low\" ."));
        assert!(text.contains("_:low1 rdf:predicate tbox:calls ."));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.ttl");
        let writer = TurtleWriter::default();
        writer.write_to_file(&sample(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), writer.render(&sample()));
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("model.ttl");
        assert!(TurtleWriter::default().write_to_file(&sample(), &path).is_err());
    }
}
