//! Java dialect
//!
//! Maps tree-sitter-java nodes onto the unified [`SyntaxNode`] enumeration.

use super::framework::{
    argument_values, child_of_kind, children_of_kind, declared_name, is_identifier_path, text,
    Annotation, Binding, ClassDecl, Dialect, DialectKind, ImportDecl, Instantiation, Invocation,
    MethodDecl, Receiver, SyntaxNode,
};
use crate::identity::CONSTRUCTOR_NAME;
use tree_sitter::{Language, Node};

const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const COMMENT_KINDS: &[&str] = &["line_comment", "block_comment", "comment"];

/// Java dialect
#[derive(Debug, Default)]
pub struct JavaDialect;

impl JavaDialect {
    /// Create a new Java dialect
    pub fn new() -> Self {
        Self
    }

    fn class_declaration(&self, node: Node, source: &str) -> ClassDecl {
        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .map(|t| compact(text(t, source)));

        let mut members = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            members.extend(self.parameters(params, source));
        }
        if let Some(body) = node.child_by_field_name("body") {
            members.extend(self.member_fields(body, source));
        }

        ClassDecl {
            name: declared_name(node, source),
            is_companion: false,
            annotations: self.annotations(node, source),
            superclass,
            constructed: None,
            members,
        }
    }

    fn anonymous_class(&self, body: Node, source: &str) -> Option<ClassDecl> {
        let parent = body.parent()?;
        let superclass = match parent.kind() {
            "object_creation_expression" => parent
                .child_by_field_name("type")
                .map(|t| compact(text(t, source))),
            "enum_constant" => None,
            _ => return None,
        };
        Some(ClassDecl {
            name: None,
            superclass,
            members: self.member_fields(body, source),
            ..ClassDecl::default()
        })
    }

    fn member_fields(&self, body: Node, source: &str) -> Vec<Binding> {
        let mut fields = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => {
                    fields.extend(self.variable_bindings(child, source))
                }
                // enum bodies nest their members one level deeper
                "enum_body_declarations" => fields.extend(self.member_fields(child, source)),
                _ => {}
            }
        }
        fields
    }

    fn method_declaration(&self, node: Node, source: &str) -> MethodDecl {
        let is_constructor = matches!(
            node.kind(),
            "constructor_declaration" | "compact_constructor_declaration"
        );
        let name = if is_constructor {
            Some(CONSTRUCTOR_NAME.to_string())
        } else {
            declared_name(node, source)
        };

        let parameters = if node.kind() == "compact_constructor_declaration" {
            // record components are the implicit parameters
            node.parent()
                .and_then(|body| body.parent())
                .and_then(|record| record.child_by_field_name("parameters"))
                .map(|p| self.parameters(p, source))
                .unwrap_or_default()
        } else {
            node.child_by_field_name("parameters")
                .map(|p| self.parameters(p, source))
                .unwrap_or_default()
        };

        MethodDecl {
            name,
            parameters,
            annotations: self.annotations(node, source),
            return_type: node
                .child_by_field_name("type")
                .map(|t| compact(text(t, source))),
            returned: node
                .child_by_field_name("body")
                .and_then(|body| self.returned_instantiation(body, source)),
        }
    }

    /// `return new T(...)` among the top-level statements of a method body
    fn returned_instantiation(&self, body: Node, source: &str) -> Option<Instantiation> {
        children_of_kind(body, &["return_statement"])
            .into_iter()
            .filter_map(|ret| ret.named_child(0))
            .find(|value| value.kind() == "object_creation_expression")
            .and_then(|value| self.instantiation(value, source))
    }

    fn parameters(&self, params: Node, source: &str) -> Vec<Binding> {
        let mut bindings = Vec::new();
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    let name = param
                        .child_by_field_name("name")
                        .map(|n| text(n, source).to_string())
                        .unwrap_or_default();
                    let type_name = param
                        .child_by_field_name("type")
                        .map(|t| compact(text(t, source)));
                    bindings.push(Binding::new(name, type_name).with_annotations(self.annotations(param, source)));
                }
                "spread_parameter" => {
                    let type_name = child_of_kind(
                        param,
                        &["type_identifier", "scoped_type_identifier", "generic_type", "integral_type",
                          "floating_point_type", "boolean_type", "array_type"],
                    )
                    .map(|t| format!("{}...", compact(text(t, source))));
                    let name = child_of_kind(param, &["variable_declarator"])
                        .and_then(|d| declared_name(d, source))
                        .unwrap_or_default();
                    bindings.push(Binding::new(name, type_name));
                }
                _ => {}
            }
        }
        bindings
    }

    /// Bindings of a field or local variable declaration: `Foo a = ..., b;`
    fn variable_bindings(&self, node: Node, source: &str) -> Vec<Binding> {
        let declared = node
            .child_by_field_name("type")
            .map(|t| compact(text(t, source)));
        let annotations = self.annotations(node, source);
        let mut bindings = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let type_name = match declared.as_deref() {
                Some("var") | None => declarator
                    .child_by_field_name("value")
                    .filter(|v| v.kind() == "object_creation_expression")
                    .and_then(|v| v.child_by_field_name("type"))
                    .map(|t| compact(text(t, source))),
                Some(t) => Some(t.to_string()),
            };
            bindings.push(Binding::new(text(name, source), type_name).with_annotations(annotations.clone()));
        }
        bindings
    }

    fn annotations(&self, node: Node, source: &str) -> Vec<Annotation> {
        let Some(modifiers) = child_of_kind(node, &["modifiers"]) else {
            return Vec::new();
        };
        children_of_kind(modifiers, &["marker_annotation", "annotation"])
            .into_iter()
            .filter_map(|a| self.annotation(a, source))
            .collect()
    }

    fn annotation(&self, node: Node, source: &str) -> Option<Annotation> {
        let name = node.child_by_field_name("name")?;
        let mut annotation = Annotation::new(compact(text(name, source)));
        let Some(args) = node.child_by_field_name("arguments") else {
            return Some(annotation);
        };
        let mut cursor = args.walk();
        for arg in args.named_children(&mut cursor) {
            if COMMENT_KINDS.contains(&arg.kind()) {
                continue;
            }
            if arg.kind() == "element_value_pair" {
                let key = arg.child_by_field_name("key").map(|k| text(k, source));
                let value = arg.child_by_field_name("value");
                if let (Some(key), Some(value)) = (key, value) {
                    annotation = annotation.with_argument(key, argument_values(value, source));
                }
            } else {
                annotation = annotation.with_argument("value", argument_values(arg, source));
            }
        }
        Some(annotation)
    }

    fn receiver(&self, object: Option<Node>, source: &str) -> Receiver {
        let Some(object) = object else {
            return Receiver::None;
        };
        match object.kind() {
            "this" => Receiver::This,
            "super" => Receiver::Super,
            "identifier" => Receiver::Name(text(object, source).to_string()),
            "field_access" | "scoped_identifier" => {
                let path = compact(text(object, source));
                if path.ends_with(".this") {
                    Receiver::This
                } else if is_identifier_path(&path) {
                    Receiver::Name(path)
                } else {
                    Receiver::Expression
                }
            }
            _ => Receiver::Expression,
        }
    }

    fn invocation(&self, node: Node, source: &str) -> Option<Invocation> {
        let name = node.child_by_field_name("name")?;
        Some(Invocation {
            receiver: self.receiver(node.child_by_field_name("object"), source),
            name: text(name, source).to_string(),
            arg_count: argument_count(node),
        })
    }

    /// `this(...)` or `super(...)` inside a constructor
    fn constructor_chain(&self, node: Node, source: &str) -> Option<Invocation> {
        let target = node.child_by_field_name("constructor")?;
        let receiver = match text(target, source) {
            "this" => Receiver::This,
            "super" => Receiver::Super,
            _ => return None,
        };
        Some(Invocation {
            receiver,
            name: CONSTRUCTOR_NAME.to_string(),
            arg_count: argument_count(node),
        })
    }

    fn instantiation(&self, node: Node, source: &str) -> Option<Instantiation> {
        let type_node = node.child_by_field_name("type")?;
        Some(Instantiation::new(compact(text(type_node, source)), argument_count(node)))
    }
}

impl Dialect for JavaDialect {
    fn name(&self) -> &str {
        "Java"
    }

    fn kind(&self) -> DialectKind {
        DialectKind::Java
    }

    fn file_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn language(&self) -> Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn classify(&self, node: Node, source: &str) -> SyntaxNode {
        if node.is_error() || node.is_missing() {
            return SyntaxNode::Other;
        }
        let kind = node.kind();
        let classified = match kind {
            "package_declaration" => child_of_kind(node, &["scoped_identifier", "identifier"])
                .map(|n| SyntaxNode::Package(compact(text(n, source)))),
            "import_declaration" => ImportDecl::parse(text(node, source)).map(SyntaxNode::Import),
            k if CLASS_KINDS.contains(&k) => {
                Some(SyntaxNode::ClassDeclaration(self.class_declaration(node, source)))
            }
            "class_body" => self
                .anonymous_class(node, source)
                .map(SyntaxNode::ClassDeclaration),
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                Some(SyntaxNode::MethodDeclaration(self.method_declaration(node, source)))
            }
            "method_invocation" => self.invocation(node, source).map(SyntaxNode::MethodInvocation),
            "explicit_constructor_invocation" => self
                .constructor_chain(node, source)
                .map(SyntaxNode::MethodInvocation),
            "object_creation_expression" => self
                .instantiation(node, source)
                .map(SyntaxNode::ObjectInstantiation),
            "field_declaration" | "local_variable_declaration" | "constant_declaration" => {
                Some(SyntaxNode::Bindings(self.variable_bindings(node, source)))
            }
            "enhanced_for_statement" => {
                let name = node.child_by_field_name("name").map(|n| text(n, source));
                let type_name = node
                    .child_by_field_name("type")
                    .map(|t| compact(text(t, source)))
                    .filter(|t| t != "var");
                name.map(|n| SyntaxNode::Bindings(vec![Binding::new(n, type_name)]))
            }
            _ => None,
        };
        classified.unwrap_or(SyntaxNode::Other)
    }
}

fn argument_count(node: Node) -> usize {
    node.child_by_field_name("arguments")
        .map(|args| {
            let mut cursor = args.walk();
            args.named_children(&mut cursor)
                .filter(|c| !COMMENT_KINDS.contains(&c.kind()))
                .count()
        })
        .unwrap_or(0)
}

/// Drop whitespace from type and path text
fn compact(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn classify_all(source: &str) -> Vec<SyntaxNode> {
        let dialect = JavaDialect::new();
        let mut parser = Parser::new();
        let tree = dialect.parse(&mut parser, source).unwrap();
        let mut out = Vec::new();
        let mut stack = vec![tree.root_node()];
        while let Some(node) = stack.pop() {
            let classified = dialect.classify(node, source);
            if classified != SyntaxNode::Other {
                out.push(classified);
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    #[test]
    fn test_declarations_and_calls() {
        let source = r#"
package com.acme;

import java.util.List;

@Service
public class A extends Base implements Runnable {
    private B b;

    public A(B b) { this.b = b; }

    public void foo(int x, String y) {
        b.bar();
        new C(x);
    }
}
"#;
        let nodes = classify_all(source);
        assert_eq!(nodes[0], SyntaxNode::Package("com.acme".into()));
        assert!(matches!(&nodes[1], SyntaxNode::Import(i) if i.path == "java.util.List"));

        let class = nodes.iter().find_map(|n| match n {
            SyntaxNode::ClassDeclaration(c) => Some(c),
            _ => None,
        }).unwrap();
        assert_eq!(class.name.as_deref(), Some("A"));
        assert_eq!(class.superclass.as_deref(), Some("Base"));
        assert_eq!(class.annotations[0].name, "Service");
        assert_eq!(class.members, vec![Binding::new("b", Some("B".into()))]);

        let methods: Vec<_> = nodes.iter().filter_map(|n| match n {
            SyntaxNode::MethodDeclaration(m) => Some(m),
            _ => None,
        }).collect();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name.as_deref(), Some(CONSTRUCTOR_NAME));
        assert_eq!(methods[0].return_type, None);
        assert_eq!(methods[1].name.as_deref(), Some("foo"));
        assert_eq!(methods[1].parameters.len(), 2);

        assert!(nodes.contains(&SyntaxNode::MethodInvocation(Invocation {
            receiver: Receiver::Name("b".into()),
            name: "bar".into(),
            arg_count: 0,
        })));
        assert!(nodes.contains(&SyntaxNode::ObjectInstantiation(Instantiation::new("C", 1))));
    }

    #[test]
    fn test_annotation_arguments() {
        let source = r#"
class Api {
    @RequestMapping(value = {"/a", "/b"}, method = RequestMethod.POST)
    void create() {}

    @GetMapping("/x")
    void read() {}
}
"#;
        let nodes = classify_all(source);
        let methods: Vec<_> = nodes.iter().filter_map(|n| match n {
            SyntaxNode::MethodDeclaration(m) => Some(m),
            _ => None,
        }).collect();

        let mapping = &methods[0].annotations[0];
        assert_eq!(mapping.name, "RequestMapping");
        assert_eq!(mapping.values(&["value"]), ["/a".to_string(), "/b".to_string()]);
        assert_eq!(mapping.values(&["method"]), ["RequestMethod.POST".to_string()]);

        let get = &methods[1].annotations[0];
        assert_eq!(get.values(&["value", "path"]), ["/x".to_string()]);
    }

    #[test]
    fn test_receivers() {
        let source = r#"
class R {
    void run() {
        helper();
        this.helper();
        super.helper();
        com.acme.Util.go();
        make().chain();
    }
}
"#;
        let receivers: Vec<_> = classify_all(source)
            .into_iter()
            .filter_map(|n| match n {
                SyntaxNode::MethodInvocation(i) => Some((i.name, i.receiver)),
                _ => None,
            })
            .collect();

        assert!(receivers.contains(&("helper".into(), Receiver::None)));
        assert!(receivers.contains(&("helper".into(), Receiver::This)));
        assert!(receivers.contains(&("helper".into(), Receiver::Super)));
        assert!(receivers.contains(&("go".into(), Receiver::Name("com.acme.Util".into()))));
        assert!(receivers.contains(&("chain".into(), Receiver::Expression)));
    }

    #[test]
    fn test_anonymous_class_body() {
        let source = r#"
class Outer {
    Runnable r = new Runnable() {
        public void run() {}
    };
}
"#;
        let anonymous = classify_all(source).into_iter().find_map(|n| match n {
            SyntaxNode::ClassDeclaration(c) if c.name.is_none() => Some(c),
            _ => None,
        });
        assert_eq!(anonymous.and_then(|c| c.superclass).as_deref(), Some("Runnable"));
    }

    #[test]
    fn test_return_and_parameter_annotations() {
        let source = r#"
class SqsConfiguration {
    @Bean("ordersConfig")
    EventProcessorConfiguration orders(@Value("${sqs.orders}") String queueUrl) {
        return new EventProcessorConfiguration(true, queueUrl);
    }
}
"#;
        let method = classify_all(source).into_iter().find_map(|n| match n {
            SyntaxNode::MethodDeclaration(m) => Some(m),
            _ => None,
        }).unwrap();
        assert_eq!(method.return_type.as_deref(), Some("EventProcessorConfiguration"));
        assert_eq!(method.returned, Some(Instantiation::new("EventProcessorConfiguration", 2)));

        let parameter = &method.parameters[0];
        assert_eq!(parameter.name, "queueUrl");
        assert_eq!(parameter.annotations[0].name, "Value");
        assert_eq!(parameter.annotations[0].values(&["value"]), ["${sqs.orders}".to_string()]);
    }

    #[test]
    fn test_var_infers_constructed_type() {
        let source = "class V { void m() { var list = new ArrayList<String>(); } }";
        let bindings = classify_all(source).into_iter().find_map(|n| match n {
            SyntaxNode::Bindings(b) => Some(b),
            _ => None,
        });
        assert_eq!(
            bindings,
            Some(vec![Binding::new("list", Some("ArrayList<String>".into()))])
        );
    }
}
