//! Type environment for one compilation unit
//!
//! Tracks what the resolver can know about names without a type checker:
//! - The unit's package and imports
//! - Types declared in the unit, and the method names each declares
//! - Types every unit of the dialect sees implicitly
//! - Lexical variable frames (fields, parameters, locals)

use crate::adapter::{DialectKind, ImportDecl};
use std::collections::{HashMap, HashSet};

const JAVA_LANG: &[&str] = &[
    "AutoCloseable", "Boolean", "Byte", "CharSequence", "Character", "Class", "Cloneable",
    "Comparable", "Deprecated", "Double", "Enum", "Error", "Exception", "Float",
    "FunctionalInterface", "IllegalArgumentException", "IllegalStateException",
    "IndexOutOfBoundsException", "Integer", "InterruptedException", "Iterable", "Long", "Math",
    "NullPointerException", "Number", "Object", "Override", "Record", "Runnable",
    "RuntimeException", "SafeVarargs", "Short", "String", "StringBuilder", "SuppressWarnings",
    "System", "Thread", "Throwable", "UnsupportedOperationException", "Void",
];

const KOTLIN: &[&str] = &[
    "Any", "Array", "Boolean", "Byte", "Char", "CharSequence", "Comparable", "Deprecated",
    "Double", "Enum", "Error", "Exception", "Float", "IllegalArgumentException",
    "IllegalStateException", "Int", "Lazy", "Long", "Nothing", "Number", "Pair", "Result",
    "RuntimeException", "Short", "String", "Suppress", "Throwable", "Triple", "Unit",
    "UnsupportedOperationException",
];

const KOTLIN_COLLECTIONS: &[&str] = &[
    "ArrayList", "Collection", "HashMap", "HashSet", "Iterable", "LinkedHashMap",
    "LinkedHashSet", "List", "Map", "MutableCollection", "MutableList", "MutableMap",
    "MutableSet", "Set",
];

const KOTLIN_JAVA_LANG: &[&str] = &["Math", "Runnable", "System", "Thread"];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// Outcome of qualifying a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Fully qualified name the unit's context pins down
    Known(String),
    /// Simple name that could come from more than one package
    Ambiguous(String),
}

impl TypeRef {
    pub fn known(&self) -> Option<&str> {
        match self {
            TypeRef::Known(name) => Some(name),
            TypeRef::Ambiguous(_) => None,
        }
    }
}

/// Per-unit name environment used by the entity resolver.
#[derive(Debug, Clone)]
pub struct TypeEnvironment {
    dialect: DialectKind,
    package: Option<String>,
    /// Simple (or alias) name → qualified name
    imports: HashMap<String, String>,
    /// Member name → owning type, from `import static a.B.member`
    static_imports: HashMap<String, String>,
    /// Owners of `import static a.B.*`
    static_wildcards: Vec<String>,
    /// Packages of `import a.b.*`
    wildcards: Vec<String>,
    /// Simple name → qualified name for every named type declared in the unit
    declared_types: HashMap<String, String>,
    /// Qualified type → method names it declares
    type_methods: HashMap<String, HashSet<String>>,
    top_level_functions: HashSet<String>,
    facade: Option<String>,
    /// Variable frames, innermost last
    frames: Vec<HashMap<String, TypeRef>>,
}

impl TypeEnvironment {
    /// Create an empty environment for a unit of the given dialect
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            package: None,
            imports: HashMap::new(),
            static_imports: HashMap::new(),
            static_wildcards: Vec::new(),
            wildcards: Vec::new(),
            declared_types: HashMap::new(),
            type_methods: HashMap::new(),
            top_level_functions: HashSet::new(),
            facade: None,
            frames: Vec::new(),
        }
    }

    pub fn dialect(&self) -> DialectKind {
        self.dialect
    }

    pub fn set_package(&mut self, package: impl Into<String>) {
        let package = package.into();
        self.package = Some(package).filter(|p| !p.is_empty());
    }

    /// Prefix a simple name with the unit's package
    pub fn in_package(&self, name: &str) -> String {
        match &self.package {
            Some(package) => format!("{}.{}", package, name),
            None => name.to_string(),
        }
    }

    pub fn add_import(&mut self, import: &ImportDecl) {
        match (import.is_static, import.is_wildcard) {
            (true, true) => self.static_wildcards.push(import.path.clone()),
            (true, false) => {
                if let Some((owner, member)) = import.path.rsplit_once('.') {
                    self.static_imports.insert(member.to_string(), owner.to_string());
                }
            }
            (false, true) => self.wildcards.push(import.path.clone()),
            (false, false) => {
                self.imports
                    .insert(import.bound_name().to_string(), import.path.clone());
            }
        }
    }

    /// Record a named type declared in this unit
    pub fn declare_type(&mut self, simple_name: &str, qualified_name: &str) {
        self.declared_types
            .entry(simple_name.to_string())
            .or_insert_with(|| qualified_name.to_string());
    }

    /// Record that `owner` declares a method called `name`
    pub fn declare_method(&mut self, owner: &str, name: &str) {
        self.type_methods
            .entry(owner.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn declares_method(&self, owner: &str, name: &str) -> bool {
        self.type_methods
            .get(owner)
            .is_some_and(|methods| methods.contains(name))
    }

    pub fn declare_top_level_function(&mut self, name: &str) {
        self.top_level_functions.insert(name.to_string());
    }

    pub fn has_top_level_function(&self, name: &str) -> bool {
        self.top_level_functions.contains(name)
    }

    /// Set the file facade owning top-level functions, from the unit's file stem
    pub fn set_facade_from_stem(&mut self, stem: &str) {
        let mut chars = stem.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => return,
        };
        self.facade = Some(self.in_package(&format!("{}Kt", capitalized)));
    }

    pub fn facade(&self) -> Option<&str> {
        self.facade.as_deref()
    }

    /// Owner of a statically imported member
    pub fn static_import_owner(&self, member: &str) -> Option<&str> {
        self.static_imports.get(member).map(String::as_str)
    }

    /// Owner of a bare call through a single static wildcard import
    pub fn single_static_wildcard(&self) -> Option<&str> {
        match self.static_wildcards.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Bind a variable in the innermost frame. Untyped bindings shadow outer ones.
    pub fn bind(&mut self, name: &str, type_name: Option<&str>) {
        if self.frames.is_empty() {
            self.push_frame();
        }
        let resolved = match type_name {
            Some(raw) => self.qualify(raw),
            None => TypeRef::Ambiguous(String::new()),
        };
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), resolved);
        }
    }

    /// Type of a variable, searching frames innermost first
    pub fn variable(&self, name: &str) -> Option<&TypeRef> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Qualify a type name as written in source.
    pub fn qualify(&self, raw: &str) -> TypeRef {
        let name = strip_type_decorations(raw);
        if name.is_empty() {
            return TypeRef::Ambiguous(name);
        }
        if PRIMITIVES.contains(&name.as_str()) {
            return TypeRef::Known(name);
        }

        let mut segments = name.split('.');
        let head = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();

        if !rest.is_empty() && !head.starts_with(char::is_uppercase) {
            return TypeRef::Known(nested_form(&name));
        }

        let head_ref = self.qualify_simple(head);
        if rest.is_empty() {
            return head_ref;
        }
        match head_ref {
            TypeRef::Known(owner) => TypeRef::Known(format!("{}${}", owner, rest.join("$"))),
            TypeRef::Ambiguous(_) => TypeRef::Ambiguous(name),
        }
    }

    fn qualify_simple(&self, name: &str) -> TypeRef {
        if let Some(declared) = self.declared_types.get(name) {
            return TypeRef::Known(declared.clone());
        }
        if let Some(imported) = self.imports.get(name) {
            return TypeRef::Known(imported.clone());
        }
        if let Some(implicit) = self.implicit(name) {
            return TypeRef::Known(implicit);
        }
        if self.wildcards.is_empty() {
            TypeRef::Known(self.in_package(name))
        } else {
            TypeRef::Ambiguous(name.to_string())
        }
    }

    fn implicit(&self, name: &str) -> Option<String> {
        let tables: &[(&str, &[&str])] = match self.dialect {
            DialectKind::Java => &[("java.lang", JAVA_LANG)],
            DialectKind::Kotlin => &[
                ("kotlin", KOTLIN),
                ("kotlin.collections", KOTLIN_COLLECTIONS),
                ("java.lang", KOTLIN_JAVA_LANG),
            ],
        };
        tables
            .iter()
            .find(|(_, names)| names.contains(&name))
            .map(|(package, _)| format!("{}.{}", package, name))
    }

    /// Every qualified name a type reference could denote, best first.
    ///
    /// Used for annotations, where a wildcard import is common and the candidate
    /// list is checked against a known set of names.
    pub fn candidates(&self, raw: &str) -> Vec<String> {
        match self.qualify(raw) {
            TypeRef::Known(name) => vec![name],
            TypeRef::Ambiguous(name) => self
                .wildcards
                .iter()
                .map(|package| format!("{}.{}", package, name))
                .chain(std::iter::once(self.in_package(&name)))
                .collect(),
        }
    }
}

/// Strip generic arguments, array brackets, varargs and nullability markers.
pub fn strip_type_decorations(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            '[' | ']' | '?' | '!' => {}
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out.trim_end_matches("...").trim_matches('.').to_string()
}

/// `com.acme.Outer.Inner` → `com.acme.Outer$Inner`
fn nested_form(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut seen_type = false;
    for (i, segment) in path.split('.').enumerate() {
        if i > 0 {
            out.push(if seen_type { '$' } else { '.' });
        }
        out.push_str(segment);
        seen_type |= segment.starts_with(char::is_uppercase);
    }
    out
}
