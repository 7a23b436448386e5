//! Core dialect framework
//!
//! Defines the unified node enumeration every front-end grammar is mapped onto,
//! and the trait each dialect implements to produce it.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// Source language family of a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Java,
    Kotlin,
}

/// An annotation as written on a class or method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Name as written, e.g. `GetMapping` or `retrofit2.http.GET`
    pub name: String,
    /// Candidate fully qualified names, filled in by the walker from the unit's imports
    pub resolved: Vec<String>,
    /// Argument values by key. Positional arguments are stored under `value`.
    pub arguments: BTreeMap<String, Vec<String>>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_argument(mut self, key: &str, values: Vec<String>) -> Self {
        self.arguments.entry(key.to_string()).or_default().extend(values);
        self
    }

    /// Check whether this annotation resolves to the given qualified name
    pub fn is(&self, qualified_name: &str) -> bool {
        self.resolved.iter().any(|r| r == qualified_name) || self.name == qualified_name
    }

    /// Values of the first present key among `keys`
    pub fn values(&self, keys: &[&str]) -> &[String] {
        keys.iter()
            .find_map(|key| self.arguments.get(*key))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// A named, typed slot: field, parameter, property or local variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    /// Declared type, or the constructed type of the initializer
    pub type_name: Option<String>,
    /// Annotations on a parameter or field, e.g. `@Qualifier("x")`
    pub annotations: Vec<Annotation>,
}

impl Binding {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// First annotation resolving to `qualified_name`
    pub fn annotation(&self, qualified_name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.is(qualified_name))
    }
}

/// An import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Imported path without the trailing `.*`
    pub path: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_wildcard: bool,
}

impl ImportDecl {
    /// Parse the text of an import directive of either dialect.
    ///
    /// `import static a.b.C.d;`, `import a.b.*;`, `import a.b.C as D`
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix("import")?.trim();
        let body = body.trim_end_matches(';').trim();
        let (is_static, body) = match body.strip_prefix("static ") {
            Some(rest) => (true, rest.trim()),
            None => (false, body),
        };
        let (body, alias) = match body.split_once(" as ") {
            Some((path, alias)) => (path.trim(), Some(alias.trim().to_string())),
            None => (body, None),
        };
        let path: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let (path, is_wildcard) = match path.strip_suffix(".*") {
            Some(prefix) => (prefix.to_string(), true),
            None => (path, false),
        };
        if path.is_empty() {
            return None;
        }
        Some(Self {
            path,
            alias,
            is_static,
            is_wildcard,
        })
    }

    /// Name the import binds in the unit (alias or last segment)
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('.').next().unwrap_or(&self.path),
        }
    }
}

/// A class-like declaration. `name` is `None` for anonymous classes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: Option<String>,
    /// Kotlin companion objects share the identity of their enclosing class
    pub is_companion: bool,
    pub annotations: Vec<Annotation>,
    pub superclass: Option<String>,
    /// Supertype an object expression constructs, e.g. Kotlin `object : Runnable {}`.
    /// Java anonymous classes report theirs through the enclosing `new` instead.
    pub constructed: Option<Instantiation>,
    /// Fields, properties and primary-constructor parameters
    pub members: Vec<Binding>,
}

/// A method, function or constructor declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodDecl {
    /// `None` when the tree is missing the name
    pub name: Option<String>,
    pub parameters: Vec<Binding>,
    pub annotations: Vec<Annotation>,
    /// Declared return type as written
    pub return_type: Option<String>,
    /// Object construction the body returns: an expression body or a `return` statement
    pub returned: Option<Instantiation>,
}

/// What a method invocation is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    /// Bare call: `foo()`
    None,
    This,
    Super,
    /// An identifier or dotted identifier path: `repo.save()`, `com.acme.Util.run()`
    Name(String),
    /// Any other expression: chained calls, indexing, literals
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub receiver: Receiver,
    pub name: String,
    pub arg_count: usize,
}

/// Value of a named call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// Contents of a string literal
    Text(String),
    /// A bare identifier, e.g. a parameter passed through
    Name(String),
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instantiation {
    /// Constructed type as written, possibly dotted or generic
    pub type_name: String,
    pub arg_count: usize,
    /// Named arguments (`queueUrl = "x"`). Positional arguments are only counted.
    pub arguments: BTreeMap<String, ArgumentValue>,
}

impl Instantiation {
    pub fn new(type_name: impl Into<String>, arg_count: usize) -> Self {
        Self {
            type_name: type_name.into(),
            arg_count,
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: BTreeMap<String, ArgumentValue>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn argument(&self, name: &str) -> Option<&ArgumentValue> {
        self.arguments.get(name)
    }
}

/// Unified node kind every dialect maps its grammar onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    Package(String),
    Import(ImportDecl),
    ClassDeclaration(ClassDecl),
    MethodDeclaration(MethodDecl),
    MethodInvocation(Invocation),
    ObjectInstantiation(Instantiation),
    Bindings(Vec<Binding>),
    Other,
}

/// Trait for dialect front-ends
///
/// Each dialect is responsible for:
/// 1. Identifying files it can parse
/// 2. Providing its tree-sitter grammar
/// 3. Classifying grammar nodes into [`SyntaxNode`]s
pub trait Dialect: Send + Sync {
    /// Get the dialect name (for display)
    fn name(&self) -> &str;

    fn kind(&self) -> DialectKind;

    /// Get file extensions this dialect handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this dialect can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    fn language(&self) -> Language;

    /// Map a grammar node onto the unified enumeration.
    ///
    /// Must never fail: anything unrecognized or malformed is [`SyntaxNode::Other`].
    fn classify(&self, node: Node, source: &str) -> SyntaxNode;

    /// Parse a unit with a caller-owned parser
    fn parse(&self, parser: &mut Parser, source: &str) -> Result<Tree> {
        parser
            .set_language(&self.language())
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;
        parser
            .parse(source, None)
            .ok_or_else(|| Error::Parse(format!("{} parser produced no tree", self.name())))
    }
}

/// Registry of dialects
#[derive(Default)]
pub struct DialectRegistry {
    dialects: Vec<Box<dyn Dialect>>,
}

impl DialectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialect
    pub fn register(&mut self, dialect: impl Dialect + 'static) {
        self.dialects.push(Box::new(dialect));
    }

    /// Find a dialect for a file
    pub fn find_dialect(&self, path: &Path) -> Option<&dyn Dialect> {
        self.dialects
            .iter()
            .find(|d| d.can_handle(path))
            .map(|d| d.as_ref())
    }
}

/// Create a default registry with all built-in dialects
pub fn default_registry() -> DialectRegistry {
    let mut registry = DialectRegistry::new();
    registry.register(super::java::JavaDialect::new());
    registry.register(super::kotlin::KotlinDialect::new());
    registry
}

// Helpers shared by the dialects

pub(crate) fn text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Name of a declaration: the `name` field, or the first identifier-like child.
pub(crate) fn declared_name(node: Node, source: &str) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(text(name, source).to_string()).filter(|n| !n.is_empty());
    }
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| matches!(c.kind(), "identifier" | "simple_identifier" | "type_identifier"))
        .map(|c| text(c, source).to_string());
    found.filter(|n| !n.is_empty())
}

pub(crate) fn child_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| kinds.contains(&c.kind()));
    found
}

pub(crate) fn children_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .collect()
}

/// Contents of every string literal under `node`, in source order.
pub(crate) fn string_literals(node: Node, source: &str) -> Vec<String> {
    if matches!(node.kind(), "string_literal" | "line_string_literal" | "multi_line_string_literal") {
        let raw = text(node, source);
        let unquoted = raw.trim_start_matches('"').trim_end_matches('"');
        return vec![unquoted.replace("\\$", "$")];
    }
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        out.extend(string_literals(child, source));
    }
    out
}

/// Contents of a string literal node with `\$` escapes undone, or `None` when it
/// is not a plain literal
pub(crate) fn literal_text(node: Node, source: &str) -> Option<String> {
    if !matches!(node.kind(), "string_literal" | "line_string_literal" | "multi_line_string_literal") {
        return None;
    }
    let mut cursor = node.walk();
    if node.named_children(&mut cursor).any(|c| c.kind().contains("interpolation")) {
        return None;
    }
    let raw = text(node, source);
    let unquoted = raw.trim_start_matches('"').trim_end_matches('"');
    Some(unquoted.replace("\\$", "$"))
}

/// Values of an annotation argument: string contents, or the expression text.
pub(crate) fn argument_values(node: Node, source: &str) -> Vec<String> {
    let strings = string_literals(node, source);
    if !strings.is_empty() {
        return strings;
    }
    let raw = text(node, source).trim();
    let inner = raw
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .or_else(|| raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')))
        .unwrap_or(raw);
    inner
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// True if every segment of a dotted path is an identifier
pub(crate) fn is_identifier_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}

pub(crate) fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct TestDialect;

    impl Dialect for TestDialect {
        fn name(&self) -> &str { "test" }
        fn kind(&self) -> DialectKind { DialectKind::Java }
        fn file_extensions(&self) -> &[&str] { &["test"] }
        fn language(&self) -> Language { tree_sitter_java::LANGUAGE.into() }
        fn classify(&self, _node: Node, _source: &str) -> SyntaxNode { SyntaxNode::Other }
    }

    #[test]
    fn test_registry() {
        let mut registry = DialectRegistry::new();
        registry.register(TestDialect);

        assert!(registry.find_dialect(Path::new("foo.test")).is_some());
        assert!(registry.find_dialect(&PathBuf::from("foo.other")).is_none());
    }

    #[test]
    fn test_default_registry_handles_both_dialects() {
        let registry = default_registry();
        assert_eq!(registry.find_dialect(Path::new("A.java")).map(|d| d.kind()), Some(DialectKind::Java));
        assert_eq!(registry.find_dialect(Path::new("A.kt")).map(|d| d.kind()), Some(DialectKind::Kotlin));
        assert!(registry.find_dialect(Path::new("A.py")).is_none());
    }

    #[test]
    fn test_import_parsing() {
        let import = ImportDecl::parse("import static com.acme.Util.helper;").unwrap();
        assert!(import.is_static);
        assert_eq!(import.path, "com.acme.Util.helper");
        assert_eq!(import.bound_name(), "helper");

        let import = ImportDecl::parse("import org.springframework.web.bind.annotation.*;").unwrap();
        assert!(import.is_wildcard);
        assert_eq!(import.path, "org.springframework.web.bind.annotation");

        let import = ImportDecl::parse("import com.acme.Order as AcmeOrder").unwrap();
        assert_eq!(import.bound_name(), "AcmeOrder");
        assert_eq!(import.path, "com.acme.Order");

        assert!(ImportDecl::parse("package com.acme;").is_none());
    }

    #[test]
    fn test_identifier_paths() {
        assert!(is_identifier_path("com.acme.Util"));
        assert!(is_identifier_path("repo"));
        assert!(!is_identifier_path("foo().bar"));
        assert!(!is_identifier_path("items[0]"));
        assert!(!is_identifier_path(""));
    }
}
