//! Turtle reader for the subset the writer emits
//!
//! Accepts one triple per line (`@prefix` lines, comments and blank lines are
//! allowed in between) and rebuilds the [`Snapshot`] the text was rendered
//! from. Name predicates derivable from `tbox:hasIdentity` are skipped.

use super::{unescape_literal, CONFIG_TYPE, RDF_NAMESPACE};
use crate::edge::{Confidence, Edge, EdgeKind};
use crate::entity::{Entity, EventConfig, Route, RouteKind};
use crate::identity::EntityKey;
use crate::model::Snapshot;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Iri(String),
    Prefixed(String, String),
    Blank(String),
    Literal(String),
    Keyword(String),
    Dot,
}

/// A resolved term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Term {
    Iri(String),
    Blank(String),
    Literal(String),
}

impl Term {
    fn as_resource(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) | Term::Blank(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct NodeRecord {
    line: usize,
    identity: Option<String>,
    declared: bool,
    parameter_types: BTreeSet<String>,
    sources: BTreeSet<String>,
    route_links: Vec<String>,
    config_links: Vec<String>,
}

#[derive(Debug, Default)]
struct ConfigRecord {
    qualifier: Option<String>,
    queue_url: Option<String>,
}

#[derive(Debug, Default)]
struct RouteRecord {
    kind: Option<RouteKind>,
    http_method: Option<String>,
    paths: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct StatementRecord {
    subject: Option<String>,
    predicate: Option<String>,
    object: Option<String>,
    low: bool,
}

/// Reads Turtle produced by [`super::TurtleWriter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleReader;

impl TurtleReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_file(&self, path: &Path) -> Result<Snapshot> {
        let text = std::fs::read_to_string(path)?;
        self.read(&text)
    }

    pub fn read(&self, text: &str) -> Result<Snapshot> {
        let mut state = ReadState::default();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let tokens = tokenize(line).map_err(|message| Error::Turtle { line: line_no, message })?;
            state
                .statement(tokens, line_no)
                .map_err(|message| Error::Turtle { line: line_no, message })?;
        }
        state.finish()
    }
}

#[derive(Debug, Default)]
struct ReadState {
    prefixes: HashMap<String, String>,
    ontology: Option<String>,
    nodes: BTreeMap<String, NodeRecord>,
    routes: BTreeMap<String, RouteRecord>,
    configs: BTreeMap<String, ConfigRecord>,
    statements: BTreeMap<String, StatementRecord>,
    edges: Vec<(String, EdgeKind, String, usize)>,
}

impl ReadState {
    fn statement(&mut self, tokens: Vec<Token>, line: usize) -> std::result::Result<(), String> {
        match tokens.as_slice() {
            [] => Ok(()),
            [Token::Keyword(kw), Token::Prefixed(prefix, local), Token::Iri(iri), Token::Dot]
                if kw == "@prefix" && local.is_empty() =>
            {
                if prefix == "tbox" {
                    self.ontology = Some(iri.clone());
                }
                self.prefixes.insert(prefix.clone(), iri.clone());
                Ok(())
            }
            [subject, predicate, object, Token::Dot] => {
                let subject = self.term(subject)?;
                let predicate = self.term(predicate)?;
                let object = self.term(object)?;
                let (Some(subject), Term::Iri(predicate)) = (subject.as_resource(), &predicate) else {
                    return Err("subject must be a resource and predicate an IRI".to_string());
                };
                self.triple(subject.to_string(), predicate, object, line)
            }
            _ => Err(format!("expected one triple terminated by '.', got {} tokens", tokens.len())),
        }
    }

    fn term(&self, token: &Token) -> std::result::Result<Term, String> {
        match token {
            Token::Iri(iri) => Ok(Term::Iri(iri.clone())),
            Token::Blank(name) => Ok(Term::Blank(format!("_:{}", name))),
            Token::Literal(value) => Ok(Term::Literal(value.clone())),
            Token::Keyword(kw) if kw == "a" => Ok(Term::Iri(format!("{}type", RDF_NAMESPACE))),
            Token::Prefixed(prefix, local) => self
                .prefixes
                .get(prefix)
                .map(|ns| Term::Iri(format!("{}{}", ns, local)))
                .ok_or_else(|| format!("undeclared prefix '{}'", prefix)),
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn triple(&mut self, subject: String, predicate: &str, object: Term, line: usize) -> std::result::Result<(), String> {
        if let Some(rdf) = predicate.strip_prefix(RDF_NAMESPACE) {
            return self.rdf_triple(subject, rdf, object, line);
        }
        let ontology = self.ontology.as_deref().ok_or("missing tbox prefix")?;
        let Some(local) = predicate.strip_prefix(ontology) else {
            return Ok(());
        };

        match (local, object) {
            ("hasIdentity", Term::Literal(value)) => self.node(subject, line).identity = Some(value),
            ("hasParameterTypes", Term::Literal(value)) => {
                self.node(subject, line).parameter_types.insert(value);
            }
            ("isDeclared", Term::Literal(value)) => self.node(subject, line).declared = value == "true",
            ("declaredIn", Term::Literal(value)) => {
                self.node(subject, line).sources.insert(value);
            }
            ("hasEndpoint" | "isRetrofitClient", Term::Iri(route)) => {
                self.node(subject, line).route_links.push(route);
            }
            ("hasHttpMethod", Term::Literal(value)) => self.route(subject).http_method = Some(value),
            ("hasPath", Term::Literal(value)) => {
                self.route(subject).paths.insert(value);
            }
            ("hasConfig", Term::Iri(config)) => self.node(subject, line).config_links.push(config),
            ("hasQualifier", Term::Literal(value)) => self.config(subject).qualifier = Some(value),
            ("hasQueueURL", Term::Literal(value)) => self.config(subject).queue_url = Some(value),
            ("calls" | "instantiates", Term::Iri(target)) => {
                let kind: EdgeKind = local.parse().map_err(|e: Error| e.to_string())?;
                self.edges.push((subject, kind, target, line))
            }
            ("hasConfidence", Term::Literal(value)) => {
                let confidence: Confidence = value.parse().map_err(|e: Error| e.to_string())?;
                self.reification(subject).low = confidence.is_low();
            }
            ("hasMethodName" | "hasFullyQualifiedClassName" | "hasSimpleName" | "hasArity", _) => {}
            (other, _) => return Err(format!("unexpected object for tbox:{}", other)),
        }
        Ok(())
    }

    fn rdf_triple(&mut self, subject: String, predicate: &str, object: Term, line: usize) -> std::result::Result<(), String> {
        let object_iri = object.as_resource().map(str::to_string);
        match predicate {
            "type" => {
                let class = object_iri.ok_or("rdf:type needs a resource object")?;
                if class == format!("{}Statement", RDF_NAMESPACE) {
                    self.reification(subject);
                    return Ok(());
                }
                let ontology = self.ontology.as_deref().ok_or("missing tbox prefix")?;
                match class.strip_prefix(ontology) {
                    Some("Method" | "Class") => {
                        self.node(subject, line);
                    }
                    Some("Endpoint") => self.route(subject).kind = Some(RouteKind::Endpoint),
                    Some("RetrofitClient") => self.route(subject).kind = Some(RouteKind::RetrofitClient),
                    Some(CONFIG_TYPE) => {
                        self.config(subject);
                    }
                    _ => return Err(format!("unknown type <{}>", class)),
                }
            }
            "subject" => self.reification(subject).subject = object_iri,
            "predicate" => self.reification(subject).predicate = object_iri,
            "object" => self.reification(subject).object = object_iri,
            other => return Err(format!("unexpected rdf:{}", other)),
        }
        Ok(())
    }

    fn node(&mut self, subject: String, line: usize) -> &mut NodeRecord {
        self.nodes.entry(subject).or_insert_with(|| NodeRecord {
            line,
            ..NodeRecord::default()
        })
    }

    fn route(&mut self, subject: String) -> &mut RouteRecord {
        self.routes.entry(subject).or_default()
    }

    fn config(&mut self, subject: String) -> &mut ConfigRecord {
        self.configs.entry(subject).or_default()
    }

    fn reification(&mut self, subject: String) -> &mut StatementRecord {
        self.statements.entry(subject).or_default()
    }

    fn finish(self) -> Result<Snapshot> {
        let mut keys: HashMap<&str, EntityKey> = HashMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for (iri, record) in &self.nodes {
            let identity = record.identity.as_deref().ok_or_else(|| Error::Turtle {
                line: record.line,
                message: format!("<{}> has no tbox:hasIdentity", iri),
            })?;
            let key = EntityKey::parse(identity)?;

            let mut entity = Entity::referenced(key.clone());
            entity.declared = record.declared;
            entity.parameter_types = record.parameter_types.clone();
            entity.sources = record.sources.clone();
            for link in &record.route_links {
                let route = self
                    .routes
                    .get(link)
                    .and_then(|r| Some(Route::new(r.kind?, r.http_method.clone()?, r.paths.clone())))
                    .ok_or_else(|| Error::Turtle {
                        line: record.line,
                        message: format!("incomplete route <{}>", link),
                    })?;
                entity.routes.insert(route);
            }
            for link in &record.config_links {
                let config = self
                    .configs
                    .get(link)
                    .and_then(|c| Some(EventConfig::new(c.qualifier.clone()?, c.queue_url.clone())))
                    .ok_or_else(|| Error::Turtle {
                        line: record.line,
                        message: format!("configuration <{}> has no tbox:hasQualifier", link),
                    })?;
                entity.configs.insert(config);
            }
            keys.insert(iri.as_str(), key);
            nodes.push(entity);
        }

        let ontology = self.ontology.as_deref().unwrap_or_default();
        let low: BTreeSet<(&str, String, &str)> = self
            .statements
            .values()
            .filter(|s| s.low)
            .filter_map(|s| Some((s.subject.as_deref()?, s.predicate.clone()?, s.object.as_deref()?)))
            .collect();

        let mut edges = Vec::with_capacity(self.edges.len());
        for (source, kind, target, line) in &self.edges {
            let lookup = |iri: &str| {
                keys.get(iri).cloned().ok_or_else(|| Error::Turtle {
                    line: *line,
                    message: format!("edge endpoint <{}> is not a node", iri),
                })
            };
            let predicate = format!("{}{}", ontology, super::turtle::edge_predicate(*kind));
            let confidence = if low.contains(&(source.as_str(), predicate, target.as_str())) {
                Confidence::Low
            } else {
                Confidence::High
            };
            edges.push(Edge::with_confidence(lookup(source)?, lookup(target)?, *kind, confidence));
        }

        Ok(Snapshot::from_parts(nodes, edges))
    }
}

/// Split one line into tokens
fn tokenize(line: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => break,
            '<' => {
                chars.next();
                let mut iri = String::new();
                loop {
                    match chars.next() {
                        Some((_, '>')) => break,
                        Some((_, ch)) => iri.push(ch),
                        None => return Err("unterminated IRI".to_string()),
                    }
                }
                tokens.push(Token::Iri(iri));
            }
            '"' => {
                chars.next();
                let mut raw = String::new();
                let mut escaped = false;
                loop {
                    match chars.next() {
                        Some((_, '"')) if !escaped => break,
                        Some((_, ch)) => {
                            escaped = !escaped && ch == '\\';
                            raw.push(ch);
                        }
                        None => return Err("unterminated literal".to_string()),
                    }
                }
                let value = unescape_literal(&raw).ok_or("invalid escape in literal")?;
                // datatype or language tag
                while chars.peek().is_some_and(|(_, ch)| !ch.is_whitespace()) {
                    chars.next();
                }
                tokens.push(Token::Literal(value));
            }
            _ => {
                let mut end = line.len();
                while let Some(&(idx, ch)) = chars.peek() {
                    if ch.is_whitespace() {
                        end = idx;
                        break;
                    }
                    chars.next();
                }
                let word = &line[start..end];
                tokens.push(match word {
                    "." => Token::Dot,
                    _ if word.starts_with("_:") => Token::Blank(word[2..].to_string()),
                    "a" | "@prefix" => Token::Keyword(word.to_string()),
                    _ => match word.split_once(':') {
                        Some((prefix, local)) => Token::Prefixed(prefix.to_string(), local.to_string()),
                        None => return Err(format!("unexpected '{}'", word)),
                    },
                });
            }
        }
    }
    Ok(tokens)
}
