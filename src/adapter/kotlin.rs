//! Kotlin dialect
//!
//! Maps tree-sitter-kotlin-ng nodes onto the unified [`SyntaxNode`] enumeration.
//! Kotlin has no `new`: a call whose callee names a type is an instantiation.

use super::framework::{
    argument_values, child_of_kind, children_of_kind, declared_name, is_identifier_path,
    literal_text, starts_uppercase, text, Annotation, ArgumentValue, Binding, ClassDecl, Dialect,
    DialectKind, ImportDecl, Instantiation, Invocation, MethodDecl, Receiver, SyntaxNode,
};
use crate::identity::CONSTRUCTOR_NAME;
use std::collections::BTreeMap;
use tree_sitter::{Language, Node};

const IDENTIFIER_KINDS: &[&str] = &["identifier", "simple_identifier"];
const LAMBDA_KINDS: &[&str] = &["annotated_lambda", "lambda_literal"];

/// Kotlin dialect
#[derive(Debug, Default)]
pub struct KotlinDialect;

impl KotlinDialect {
    /// Create a new Kotlin dialect
    pub fn new() -> Self {
        Self
    }

    fn class_declaration(&self, node: Node, source: &str) -> ClassDecl {
        let is_companion = node.kind() == "companion_object";
        let is_literal = node.kind() == "object_literal";
        let name = if is_literal {
            None
        } else if is_companion {
            Some(declared_name(node, source).unwrap_or_else(|| "Companion".to_string()))
        } else {
            declared_name(node, source)
        };

        let (superclass, interfaces) = self.supertypes(node, source);
        let constructed = if is_literal {
            superclass
                .clone()
                .or_else(|| interfaces.first().map(|i| Instantiation::new(i.as_str(), 0)))
        } else {
            None
        };

        let mut members = Vec::new();
        if let Some(constructor) = child_of_kind(node, &["primary_constructor"]) {
            members.extend(self.parameters(constructor, source));
        }
        if let Some(body) = child_of_kind(node, &["class_body", "enum_class_body"]) {
            for property in children_of_kind(body, &["property_declaration"]) {
                members.extend(self.property_bindings(property, source));
            }
        }

        ClassDecl {
            name,
            is_companion,
            annotations: self.annotations(node, source),
            superclass: superclass.map(|s| s.type_name),
            constructed,
            members,
        }
    }

    /// Supertypes from delegation specifiers: the one invoked as a constructor is
    /// the superclass, the rest are interfaces.
    fn supertypes(&self, node: Node, source: &str) -> (Option<Instantiation>, Vec<String>) {
        let mut specifiers = children_of_kind(node, &["delegation_specifier"]);
        if let Some(list) = child_of_kind(node, &["delegation_specifiers"]) {
            specifiers.extend(children_of_kind(list, &["delegation_specifier"]));
        }

        let mut superclass = None;
        let mut interfaces = Vec::new();
        for specifier in specifiers {
            if let Some(invocation) = child_of_kind(specifier, &["constructor_invocation"]) {
                superclass = child_of_kind(invocation, &["user_type"])
                    .map(|t| Instantiation::new(type_text(t, source), call_argument_count(invocation)));
            } else if let Some(user_type) = child_of_kind(specifier, &["user_type"]) {
                interfaces.push(type_text(user_type, source));
            }
        }
        (superclass, interfaces)
    }

    fn function_declaration(&self, node: Node, source: &str) -> MethodDecl {
        let is_constructor = node.kind() == "secondary_constructor";
        let name = if is_constructor {
            Some(CONSTRUCTOR_NAME.to_string())
        } else {
            declared_name(node, source)
        };
        let parameters = child_of_kind(node, &["function_value_parameters"])
            .map(|p| self.parameters(p, source))
            .unwrap_or_default();
        // the return type follows the parameter list; a receiver type precedes it
        let return_type = {
            let mut cursor = node.walk();
            let mut after_parameters = false;
            let mut found = None;
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "function_value_parameters" => after_parameters = true,
                    "user_type" | "nullable_type" | "function_type" | "parenthesized_type" if after_parameters => {
                        found = Some(type_text(child, source));
                        break;
                    }
                    _ => {}
                }
            }
            found
        };
        let returned = child_of_kind(node, &["function_body"])
            .and_then(|body| self.returned_instantiation(body, source));

        MethodDecl {
            name,
            parameters,
            annotations: self.annotations(node, source),
            return_type,
            returned,
        }
    }

    /// Construction an expression body evaluates to, or the first top-level
    /// `return T(...)` of a block body
    fn returned_instantiation(&self, body: Node, source: &str) -> Option<Instantiation> {
        let value = match child_of_kind(body, &["block"]) {
            Some(block) => children_of_kind(block, &["return_expression"])
                .into_iter()
                .filter_map(|ret| ret.named_child(ret.named_child_count().checked_sub(1)?))
                .find(|value| value.kind() == "call_expression")?,
            None => body.named_child(0)?,
        };
        match self.call(value, source)? {
            SyntaxNode::ObjectInstantiation(site) => Some(site),
            _ => None,
        }
    }

    /// Parameters under `node`, at any depth short of a nested body. Annotations of
    /// a function parameter sit in a preceding `parameter_modifiers` sibling.
    fn parameters(&self, node: Node, source: &str) -> Vec<Binding> {
        let mut bindings = Vec::new();
        let mut pending = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameter_modifiers" => {
                    pending = children_of_kind(child, &["annotation"])
                        .into_iter()
                        .filter_map(|a| self.annotation(a, source))
                        .collect();
                }
                "parameter" | "class_parameter" => {
                    let mut annotations = std::mem::take(&mut pending);
                    annotations.extend(self.annotations(child, source));
                    if let Some(name) = declared_name(child, source) {
                        let type_name = parameter_type(child, source);
                        bindings.push(Binding::new(name, type_name).with_annotations(annotations));
                    }
                }
                "class_parameters" | "function_value_parameter" | "parameter_with_optional_type" => {
                    bindings.extend(self.parameters(child, source))
                }
                _ => {}
            }
        }
        bindings
    }

    fn property_bindings(&self, node: Node, source: &str) -> Vec<Binding> {
        let Some(variable) = child_of_kind(node, &["variable_declaration"]) else {
            return Vec::new();
        };
        let Some(name) = declared_name(variable, source) else {
            return Vec::new();
        };
        let declared = parameter_type(variable, source);
        let inferred = || {
            let mut cursor = node.walk();
            let initializer = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "call_expression");
            initializer.and_then(|call| match self.call(call, source) {
                Some(SyntaxNode::ObjectInstantiation(inst)) => Some(inst.type_name),
                _ => None,
            })
        };
        vec![Binding::new(name, declared.or_else(inferred)).with_annotations(self.annotations(node, source))]
    }

    fn annotations(&self, node: Node, source: &str) -> Vec<Annotation> {
        let mut nodes = children_of_kind(node, &["annotation"]);
        if let Some(modifiers) = child_of_kind(node, &["modifiers"]) {
            nodes.extend(children_of_kind(modifiers, &["annotation"]));
        }
        nodes
            .into_iter()
            .filter_map(|a| self.annotation(a, source))
            .collect()
    }

    fn annotation(&self, node: Node, source: &str) -> Option<Annotation> {
        if let Some(user_type) = child_of_kind(node, &["user_type"]) {
            return Some(Annotation::new(type_text(user_type, source)));
        }
        let invocation = child_of_kind(node, &["constructor_invocation"])?;
        let user_type = child_of_kind(invocation, &["user_type"])?;
        let mut annotation = Annotation::new(type_text(user_type, source));
        if let Some(args) = child_of_kind(invocation, &["value_arguments"]) {
            for arg in children_of_kind(args, &["value_argument"]) {
                let (key, value) = value_argument(arg, source);
                if let Some(value) = value {
                    annotation = annotation.with_argument(&key, argument_values(value, source));
                }
            }
        }
        Some(annotation)
    }

    /// Classify a call expression as an invocation or an instantiation
    fn call(&self, node: Node, source: &str) -> Option<SyntaxNode> {
        let callee = node.named_child(0)?;
        let arg_count = call_argument_count(node);
        let construct = |type_name: String| {
            SyntaxNode::ObjectInstantiation(
                Instantiation::new(type_name, arg_count).with_arguments(named_arguments(node, source)),
            )
        };
        match callee.kind() {
            k if IDENTIFIER_KINDS.contains(&k) => {
                let name = text(callee, source).to_string();
                if starts_uppercase(&name) {
                    Some(construct(name))
                } else {
                    Some(SyntaxNode::MethodInvocation(Invocation {
                        receiver: Receiver::None,
                        name,
                        arg_count,
                    }))
                }
            }
            "navigation_expression" => {
                let member = navigation_member(callee, source)?;
                let target = callee.named_child(0)?;
                let receiver = self.receiver(target, source);

                if starts_uppercase(&member) {
                    if let Receiver::Name(path) = &receiver {
                        return Some(construct(format!("{}.{}", path, member)));
                    }
                }
                Some(SyntaxNode::MethodInvocation(Invocation {
                    receiver,
                    name: member,
                    arg_count,
                }))
            }
            _ => None,
        }
    }

    fn receiver(&self, target: Node, source: &str) -> Receiver {
        match target.kind() {
            "this_expression" => Receiver::This,
            "super_expression" => Receiver::Super,
            k if IDENTIFIER_KINDS.contains(&k) => Receiver::Name(text(target, source).to_string()),
            "navigation_expression" => {
                let path: String = text(target, source).chars().filter(|c| !c.is_whitespace()).collect();
                if is_identifier_path(&path) {
                    Receiver::Name(path)
                } else {
                    Receiver::Expression
                }
            }
            _ => match text(target, source) {
                "this" => Receiver::This,
                "super" => Receiver::Super,
                _ => Receiver::Expression,
            },
        }
    }
}

impl Dialect for KotlinDialect {
    fn name(&self) -> &str {
        "Kotlin"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Kotlin
    }

    fn file_extensions(&self) -> &[&str] {
        &["kt", "kts"]
    }

    fn language(&self) -> Language {
        tree_sitter_kotlin_ng::LANGUAGE.into()
    }

    fn classify(&self, node: Node, source: &str) -> SyntaxNode {
        if node.is_error() || node.is_missing() {
            return SyntaxNode::Other;
        }
        let classified = match node.kind() {
            "package_header" => {
                let raw = text(node, source).trim();
                let name: String = raw
                    .strip_prefix("package")
                    .unwrap_or(raw)
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != ';')
                    .collect();
                Some(SyntaxNode::Package(name)).filter(|_| !raw.is_empty())
            }
            "import" | "import_header" => {
                ImportDecl::parse(text(node, source)).map(SyntaxNode::Import)
            }
            "class_declaration" | "object_declaration" | "companion_object" | "object_literal" => {
                Some(SyntaxNode::ClassDeclaration(self.class_declaration(node, source)))
            }
            "function_declaration" | "secondary_constructor" => {
                Some(SyntaxNode::MethodDeclaration(self.function_declaration(node, source)))
            }
            "call_expression" => self.call(node, source),
            "property_declaration" => {
                Some(SyntaxNode::Bindings(self.property_bindings(node, source)))
            }
            _ => None,
        };
        classified.unwrap_or(SyntaxNode::Other)
    }
}

/// Declared type of a parameter or variable, with nullability kept for display
fn parameter_type(node: Node, source: &str) -> Option<String> {
    child_of_kind(node, &["user_type", "nullable_type", "function_type", "type"])
        .map(|t| type_text(t, source))
}

fn type_text(node: Node, source: &str) -> String {
    text(node, source).chars().filter(|c| !c.is_whitespace()).collect()
}

/// Last identifier of `a.b.c`, looking through a `navigation_suffix` if present
fn navigation_member(node: Node, source: &str) -> Option<String> {
    let count = node.named_child_count();
    let last = node.named_child(count.checked_sub(1)?)?;
    if count < 2 {
        return None;
    }
    let identifier = if last.kind() == "navigation_suffix" {
        child_of_kind(last, IDENTIFIER_KINDS)?
    } else if IDENTIFIER_KINDS.contains(&last.kind()) {
        last
    } else {
        return None;
    };
    Some(text(identifier, source).to_string())
}

/// Arguments of a call, counting a trailing lambda as one
fn call_argument_count(node: Node) -> usize {
    let mut holders = vec![node];
    if let Some(suffix) = child_of_kind(node, &["call_suffix"]) {
        holders.push(suffix);
    }
    holders
        .into_iter()
        .map(|holder| {
            let values = child_of_kind(holder, &["value_arguments"])
                .map(|args| children_of_kind(args, &["value_argument"]).len())
                .unwrap_or(0);
            values + children_of_kind(holder, LAMBDA_KINDS).len()
        })
        .sum()
}

/// Named arguments of a call: `queueUrl = "x"`, `configuration = configuration`
fn named_arguments(node: Node, source: &str) -> BTreeMap<String, ArgumentValue> {
    let mut arguments = BTreeMap::new();
    let Some(args) = child_of_kind(node, &["value_arguments"]) else {
        return arguments;
    };
    for arg in children_of_kind(args, &["value_argument"]) {
        if arg.named_child_count() < 2 {
            continue;
        }
        let (key, value) = value_argument(arg, source);
        let Some(value) = value else {
            continue;
        };
        let value = match literal_text(value, source) {
            Some(literal) => ArgumentValue::Text(literal),
            None if IDENTIFIER_KINDS.contains(&value.kind()) => {
                ArgumentValue::Name(text(value, source).to_string())
            }
            None => ArgumentValue::Expression,
        };
        arguments.insert(key, value);
    }
    arguments
}

/// Split a value argument into its key (`value` when positional) and expression
fn value_argument<'t>(node: Node<'t>, source: &str) -> (String, Option<Node<'t>>) {
    let count = node.named_child_count();
    let value = count.checked_sub(1).and_then(|i| node.named_child(i));
    if count >= 2 {
        if let Some(first) = node.named_child(0).filter(|f| IDENTIFIER_KINDS.contains(&f.kind())) {
            return (text(first, source).to_string(), value);
        }
    }
    ("value".to_string(), value)
}
