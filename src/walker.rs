//! Syntax Tree Walker - Depth-first visit of one compilation unit
//!
//! Each unit is walked twice:
//! 1. An indexing pass records the package, imports, declared types and the
//!    method names each type declares, so later references resolve
//! 2. The main pass pushes and pops scopes and records nodes and edges
//!
//! Only the main pass touches the shared [`KnowledgeModel`].

use crate::adapter::{
    Annotation, Binding, ClassDecl, Dialect, Instantiation, Invocation, MethodDecl, SyntaxNode,
};
use crate::classify::{ClassifierRegistry, ConstructionContext, MethodContext};
use crate::edge::{Confidence, EdgeKind};
use crate::entity::Entity;
use crate::identity::EntityKey;
use crate::model::{KnowledgeModel, NodeHandle};
use crate::resolver::{EntityResolver, Resolution};
use crate::scope::{ClassFrame, ScopeStack, TypeEnvironment};
use crate::Result;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Counters for one or more walked units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub declarations: usize,
    pub calls: usize,
    pub instantiations: usize,
    /// Edges sourced from the unscoped root
    pub unscoped: usize,
    pub low_confidence: usize,
    /// Targets left out by the ignored-owner filter
    pub ignored: usize,
    /// Error nodes and declarations missing a name
    pub skipped: usize,
}

impl std::ops::AddAssign for WalkStats {
    fn add_assign(&mut self, other: Self) {
        self.declarations += other.declarations;
        self.calls += other.calls;
        self.instantiations += other.instantiations;
        self.unscoped += other.unscoped;
        self.low_confidence += other.low_confidence;
        self.ignored += other.ignored;
        self.skipped += other.skipped;
    }
}

/// Walks compilation units into a shared model.
///
/// A walker holds only shared references, so one can serve every worker of a
/// parallel scan; each unit gets its own scope stack and type environment.
#[derive(Clone, Copy)]
pub struct Walker<'a> {
    model: &'a KnowledgeModel,
    resolver: &'a EntityResolver,
    classifiers: &'a ClassifierRegistry,
}

impl<'a> Walker<'a> {
    pub fn new(
        model: &'a KnowledgeModel,
        resolver: &'a EntityResolver,
        classifiers: &'a ClassifierRegistry,
    ) -> Self {
        Self {
            model,
            resolver,
            classifiers,
        }
    }

    /// Parse `source` and walk it
    pub fn walk_source(
        &self,
        parser: &mut Parser,
        dialect: &dyn Dialect,
        source: &str,
        path: &str,
    ) -> Result<WalkStats> {
        let tree = dialect.parse(parser, source)?;
        Ok(self.walk_tree(dialect, &tree, source, path))
    }

    /// Walk an already parsed unit
    pub fn walk_tree(&self, dialect: &dyn Dialect, tree: &Tree, source: &str, path: &str) -> WalkStats {
        let mut unit = UnitWalk {
            walker: *self,
            dialect,
            source,
            path,
            env: TypeEnvironment::new(dialect.kind()),
            stack: ScopeStack::new(),
            top_level_anonymous: 0,
            stats: WalkStats::default(),
        };
        let root = tree.root_node();
        unit.index(root, &mut Vec::new());
        if let Some(stem) = Path::new(path).file_stem().and_then(|s| s.to_str()) {
            if dialect.kind() == crate::adapter::DialectKind::Kotlin {
                unit.env.set_facade_from_stem(stem);
            }
        }
        unit.visit(root);
        debug_assert!(unit.stack.is_empty());

        debug!(
            "Walked {} ({}): {} declarations, {} calls, {} instantiations",
            path,
            dialect.name(),
            unit.stats.declarations,
            unit.stats.calls,
            unit.stats.instantiations
        );
        unit.stats
    }
}

/// State of one unit walk
struct UnitWalk<'w> {
    walker: Walker<'w>,
    dialect: &'w dyn Dialect,
    source: &'w str,
    path: &'w str,
    env: TypeEnvironment,
    stack: ScopeStack,
    top_level_anonymous: u32,
    stats: WalkStats,
}

impl<'w> UnitWalk<'w> {
    /// Indexing pass. `classes` holds the enclosing named classes; `None` marks
    /// an anonymous class whose members are not indexed.
    fn index(&mut self, node: Node, classes: &mut Vec<Option<String>>) {
        match self.dialect.classify(node, self.source) {
            SyntaxNode::Package(package) => {
                self.env.set_package(package);
                return;
            }
            SyntaxNode::Import(import) => {
                self.env.add_import(&import);
                return;
            }
            SyntaxNode::ClassDeclaration(decl) => {
                let qualified = match (&decl.name, classes.last()) {
                    (Some(_), Some(Some(outer))) if decl.is_companion => Some(outer.clone()),
                    (Some(name), Some(Some(outer))) => Some(format!("{}${}", outer, name)),
                    (Some(name), None) => Some(self.env.in_package(name)),
                    _ => None,
                };
                if let (Some(name), Some(qualified)) = (&decl.name, &qualified) {
                    if !decl.is_companion {
                        self.env.declare_type(name, qualified);
                    }
                }
                classes.push(qualified);
                self.index_children(node, classes);
                classes.pop();
                return;
            }
            SyntaxNode::MethodDeclaration(decl) => {
                if let Some(name) = &decl.name {
                    match classes.last() {
                        Some(Some(owner)) => self.env.declare_method(owner, name),
                        Some(None) => {}
                        None => self.env.declare_top_level_function(name),
                    }
                }
            }
            _ => {}
        }
        self.index_children(node, classes);
    }

    fn index_children(&mut self, node: Node, classes: &mut Vec<Option<String>>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.index(child, classes);
        }
    }

    /// Main pass
    fn visit(&mut self, node: Node) {
        if node.is_error() {
            self.stats.skipped += 1;
        }
        match self.dialect.classify(node, self.source) {
            SyntaxNode::Package(_) | SyntaxNode::Import(_) => {}
            SyntaxNode::ClassDeclaration(decl) => self.enter_class(node, decl),
            SyntaxNode::MethodDeclaration(decl) => self.enter_method(node, decl),
            SyntaxNode::MethodInvocation(site) => {
                self.record_invocation(&site);
                self.visit_children(node);
            }
            SyntaxNode::ObjectInstantiation(site) => {
                self.record_instantiation(&site);
                self.visit_children(node);
            }
            SyntaxNode::Bindings(bindings) => {
                for binding in &bindings {
                    self.env.bind(&binding.name, binding.type_name.as_deref());
                }
                self.visit_children(node);
            }
            SyntaxNode::Other => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    fn enter_class(&mut self, node: Node, decl: ClassDecl) {
        // `object : T {}` constructs T where it is written
        if let Some(site) = &decl.constructed {
            self.record_instantiation(site);
        }
        let members = self.resolve_bindings(decl.members);

        let enclosing = self.stack.current_class().map(|c| c.qualified_name.clone());
        let qualified_name = match (&decl.name, enclosing) {
            // a companion is its enclosing class: same node, same frame, same anonymous counter
            (_, Some(_)) if decl.is_companion => {
                self.env.push_frame();
                for member in &members {
                    self.env.bind(&member.name, member.type_name.as_deref());
                }
                self.visit_children(node);
                self.env.pop_frame();
                return;
            }
            (Some(name), Some(outer)) => format!("{}${}", outer, name),
            (Some(name), None) => self.env.in_package(name),
            (None, _) => self.anonymous_name(),
        };
        let entity = Entity::declared(EntityKey::class(qualified_name.as_str()), self.path);
        let handle = self.walker.model.insert_or_get_node(entity);
        self.stats.declarations += 1;

        let superclass = decl
            .superclass
            .as_deref()
            .and_then(|s| self.env.qualify(s).known().map(str::to_string));

        self.env.push_frame();
        for member in &members {
            self.env.bind(&member.name, member.type_name.as_deref());
        }
        let frame = ClassFrame::new(qualified_name, handle)
            .with_annotations(self.resolve_annotations(decl.annotations))
            .with_superclass(superclass)
            .with_members(members);
        self.stack.push_class(frame);
        self.visit_children(node);
        self.stack.pop();
        self.env.pop_frame();
    }

    fn anonymous_name(&mut self) -> String {
        if let Some(name) = self.stack.next_anonymous_name() {
            return name;
        }
        self.top_level_anonymous += 1;
        let base = match self.env.facade() {
            Some(facade) => facade.to_string(),
            None => self.env.in_package("<file>"),
        };
        format!("{}${}", base, self.top_level_anonymous)
    }

    fn enter_method(&mut self, node: Node, decl: MethodDecl) {
        let owner = self
            .stack
            .current_class()
            .map(|c| c.qualified_name.clone())
            .or_else(|| self.facade_owner());

        let (Some(name), Some(owner)) = (decl.name.as_deref(), owner) else {
            self.stats.skipped += 1;
            self.visit_children(node);
            return;
        };

        let key = self
            .walker
            .resolver
            .method_declaration(&owner, name, decl.parameters.len());
        let method_annotations = self.resolve_annotations(decl.annotations);
        let parameters = self.resolve_bindings(decl.parameters);
        let return_types: Vec<String> = decl
            .return_type
            .iter()
            .chain(decl.returned.iter().map(|site| &site.type_name))
            .flat_map(|raw| self.env.candidates(raw))
            .collect();

        let (routes, configs) = {
            let class_annotations = self
                .stack
                .current_class()
                .map(|class| class.annotations.as_slice())
                .unwrap_or(&[]);
            let context = MethodContext::new(class_annotations, &method_annotations)
                .with_signature(name, &parameters)
                .with_returns(&return_types, decl.returned.as_ref());
            let classifiers = self.walker.classifiers;
            (classifiers.classify(&context), classifiers.classify_bean_factory(&context))
        };
        if !configs.is_empty() {
            debug!("{} produces {} event configuration(s)", key, configs.len());
        }

        let parameter_types: Vec<&str> = parameters
            .iter()
            .map(|p| p.type_name.as_deref().unwrap_or("?"))
            .collect();
        let entity = Entity::declared(key.clone(), self.path)
            .with_parameter_types(&parameter_types)
            .with_routes(routes)
            .with_configs(configs);
        let handle = self.walker.model.insert_or_get_node(entity);
        self.stats.declarations += 1;

        self.stack.push_method(key, handle);
        self.env.push_frame();
        for parameter in &parameters {
            self.env.bind(&parameter.name, parameter.type_name.as_deref());
        }
        self.visit_children(node);
        self.env.pop_frame();
        self.stack.pop();
    }

    /// Kotlin top-level functions belong to the file facade class
    fn facade_owner(&self) -> Option<String> {
        let facade = self.env.facade()?.to_string();
        self.walker
            .model
            .insert_or_get_node(Entity::declared(EntityKey::class(facade.as_str()), self.path));
        Some(facade)
    }

    fn resolve_annotations(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        annotations
            .into_iter()
            .map(|mut annotation| {
                annotation.resolved = self.env.candidates(&annotation.name);
                annotation
            })
            .collect()
    }

    fn resolve_bindings(&self, bindings: Vec<Binding>) -> Vec<Binding> {
        bindings
            .into_iter()
            .map(|mut binding| {
                binding.annotations = self.resolve_annotations(std::mem::take(&mut binding.annotations));
                binding
            })
            .collect()
    }

    /// Attach the configuration a construction site wires in to the enclosing class
    fn classify_construction(&self, site: &Instantiation) {
        let Some(class) = self.stack.current_class() else {
            return;
        };
        let type_candidates = self.env.candidates(&site.type_name);
        let context = ConstructionContext {
            site,
            type_candidates: &type_candidates,
            class_members: &class.members,
        };
        if let Some(config) = self.walker.classifiers.classify_construction(&context) {
            debug!("{} consumes event configuration {}", class.qualified_name, config.qualifier);
            let consumer = Entity::referenced(EntityKey::class(class.qualified_name.as_str()));
            self.walker.model.insert_or_get_node(consumer.with_configs([config]));
        }
    }

    fn record_invocation(&mut self, site: &Invocation) {
        let resolution = self
            .walker
            .resolver
            .resolve_invocation(&self.env, &self.stack, site);
        if self.record(resolution, EdgeKind::Calls) {
            self.stats.calls += 1;
        }
    }

    fn record_instantiation(&mut self, site: &Instantiation) {
        self.classify_construction(site);
        let resolution = self.walker.resolver.resolve_instantiation(&self.env, site);
        if self.record(resolution, EdgeKind::Instantiates) {
            self.stats.instantiations += 1;
        }
    }

    /// Record an edge from the enclosing method, or from the unscoped root.
    /// Returns false when the target is filtered out.
    fn record(&mut self, resolution: Resolution, kind: EdgeKind) -> bool {
        if self.walker.resolver.is_ignored(&resolution.key) {
            self.stats.ignored += 1;
            return false;
        }
        let source = match self.stack.current_enclosing_method() {
            Some(method) => method.handle,
            None => {
                self.stats.unscoped += 1;
                self.unscoped_root()
            }
        };
        if resolution.confidence == Confidence::Low {
            self.stats.low_confidence += 1;
        }
        self.walker.model.record(
            source,
            Entity::referenced(resolution.key),
            kind,
            resolution.confidence,
        );
        true
    }

    fn unscoped_root(&self) -> NodeHandle {
        self.walker.model.unscoped_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{JavaDialect, KotlinDialect};
    use crate::classify::default_classifiers;
    use crate::edge::Edge;
    use crate::entity::{EventConfig, RouteKind};
    use crate::model::Snapshot;

    fn walk(dialect: &dyn Dialect, units: &[(&str, &str)]) -> (Snapshot, WalkStats) {
        walk_with(EntityResolver::new(), dialect, units)
    }

    fn walk_with(
        resolver: EntityResolver,
        dialect: &dyn Dialect,
        units: &[(&str, &str)],
    ) -> (Snapshot, WalkStats) {
        let model = KnowledgeModel::new();
        let classifiers = default_classifiers();
        let walker = Walker::new(&model, &resolver, &classifiers);
        let mut parser = Parser::new();
        let mut stats = WalkStats::default();
        for (path, source) in units {
            stats += walker.walk_source(&mut parser, dialect, source, path).unwrap();
        }
        (model.snapshot(), stats)
    }

    fn has_edge(snapshot: &Snapshot, source: &str, kind: EdgeKind, target: &str) -> bool {
        snapshot
            .edges
            .iter()
            .any(|e: &Edge| e.source.to_key_string() == source && e.kind == kind && e.target.to_key_string() == target)
    }

    /// Edges as sorted `source kind target` lines
    fn edge_lines(snapshot: &Snapshot) -> Vec<String> {
        let mut lines: Vec<String> = snapshot
            .edges
            .iter()
            .map(|e| format!("{} {} {}", e.source.to_key_string(), e.kind, e.target.to_key_string()))
            .collect();
        lines.sort();
        lines
    }

    const EXAMPLE: &str = r#"
package com.acme;

class A {
    void foo() {
        B.bar();
        new C();
    }
}
"#;

    #[test]
    fn test_call_and_instantiation_example() {
        let java = JavaDialect::new();
        let (snapshot, stats) = walk(&java, &[("src/A.java", EXAMPLE)]);

        let keys: Vec<String> = snapshot.nodes.iter().map(|n| n.key.to_key_string()).collect();
        assert_eq!(
            keys,
            vec![
                "class:com.acme.A",
                "class:com.acme.C",
                "method:com.acme.A.foo(0)",
                "method:com.acme.B.bar(0)",
            ]
        );
        assert_eq!(snapshot.edges.len(), 2);
        assert!(has_edge(&snapshot, "method:com.acme.A.foo(0)", EdgeKind::Calls, "method:com.acme.B.bar(0)"));
        assert!(has_edge(&snapshot, "method:com.acme.A.foo(0)", EdgeKind::Instantiates, "class:com.acme.C"));
        assert!(snapshot.edges.iter().all(|e| e.confidence == Confidence::High));
        assert_eq!(stats.declarations, 2);
        assert_eq!(stats.unscoped, 0);

        let foo = snapshot.node(&EntityKey::method("com.acme.A", "foo", 0)).unwrap();
        assert!(foo.declared);
        assert!(foo.sources.contains("src/A.java"));
        assert!(!snapshot.node(&EntityKey::method("com.acme.B", "bar", 0)).unwrap().declared);
    }

    #[test]
    fn test_same_unit_twice_is_idempotent() {
        let java = JavaDialect::new();
        let (once, _) = walk(&java, &[("src/A.java", EXAMPLE)]);
        let (twice, _) = walk(&java, &[("src/A.java", EXAMPLE), ("src/A.java", EXAMPLE)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_field_initializer_call_is_unscoped() {
        let source = r#"
package com.acme;

class A {
    private int x = compute();
    static { Registry.register(); }
    int compute() { return 1; }
}
"#;
        let java = JavaDialect::new();
        let (snapshot, stats) = walk(&java, &[("A.java", source)]);

        assert!(snapshot.node(&EntityKey::unscoped_root()).is_some());
        assert!(has_edge(&snapshot, "method:<unscoped>", EdgeKind::Calls, "method:com.acme.A.compute(0)"));
        assert!(has_edge(&snapshot, "method:<unscoped>", EdgeKind::Calls, "method:com.acme.Registry.register(0)"));
        assert_eq!(stats.unscoped, 2);
    }

    #[test]
    fn test_repeated_calls_yield_one_edge() {
        let source = r#"
class A {
    void foo(Helper h) {
        h.run();
        h.run();
        h.run();
    }
}
"#;
        let java = JavaDialect::new();
        let (snapshot, stats) = walk(&java, &[("A.java", source)]);
        assert_eq!(stats.calls, 3);
        assert_eq!(snapshot.edges.len(), 1);
        assert!(has_edge(&snapshot, "method:A.foo(1)", EdgeKind::Calls, "method:Helper.run(0)"));
    }

    #[test]
    fn test_nested_and_anonymous_classes() {
        let source = r#"
package com.acme;

class Outer {
    static class Inner {
        void work() {}
    }

    void start() {
        Runnable r = new Runnable() {
            public void run() { helper(); }
        };
        new Inner().work();
    }

    void helper() {}
}
"#;
        let java = JavaDialect::new();
        let (snapshot, _) = walk(&java, &[("Outer.java", source)]);

        assert!(snapshot.node(&EntityKey::class("com.acme.Outer$Inner")).is_some());
        assert!(snapshot.node(&EntityKey::method("com.acme.Outer$Inner", "work", 0)).is_some());
        assert!(snapshot.node(&EntityKey::method("com.acme.Outer$1", "run", 0)).is_some());
        // helper is declared on Outer, not on the anonymous class
        assert!(has_edge(&snapshot, "method:com.acme.Outer$1.run(0)", EdgeKind::Calls, "method:com.acme.Outer.helper(0)"));
        assert!(has_edge(&snapshot, "method:com.acme.Outer.start(0)", EdgeKind::Instantiates, "class:com.acme.Outer$Inner"));
        assert!(has_edge(&snapshot, "method:com.acme.Outer.start(0)", EdgeKind::Instantiates, "class:java.lang.Runnable"));
    }

    #[test]
    fn test_unresolved_receiver_is_low_confidence() {
        let source = r#"
class A {
    void foo() {
        make().total(1, 2);
    }
}
"#;
        let java = JavaDialect::new();
        let (snapshot, stats) = walk(&java, &[("A.java", source)]);
        let edge = snapshot
            .edges
            .iter()
            .find(|e| e.target.to_key_string() == "method:<unresolved>.total(2)")
            .unwrap();
        assert_eq!(edge.confidence, Confidence::Low);
        assert_eq!(stats.low_confidence, 1);
    }

    #[test]
    fn test_spring_endpoint_routes() {
        let source = r#"
package com.acme.api;

import org.springframework.web.bind.annotation.GetMapping;
import org.springframework.web.bind.annotation.RequestMapping;
import org.springframework.web.bind.annotation.RestController;

@RestController
@RequestMapping("/v1")
public class OrderController {
    @GetMapping("/x")
    public String read() { return "ok"; }
}
"#;
        let java = JavaDialect::new();
        let (snapshot, _) = walk(&java, &[("OrderController.java", source)]);
        let method = snapshot
            .node(&EntityKey::method("com.acme.api.OrderController", "read", 0))
            .unwrap();
        assert_eq!(method.routes.len(), 1);
        let route = method.routes.iter().next().unwrap();
        assert_eq!(route.kind, RouteKind::Endpoint);
        assert_eq!(route.to_string(), "GET /v1/x");
    }

    #[test]
    fn test_retrofit_interface_routes() {
        let source = r#"
package com.acme.client;

import retrofit2.http.GET;

public interface UserClient {
    @GET("users")
    Call<List<User>> users();
}
"#;
        let java = JavaDialect::new();
        let (snapshot, _) = walk(&java, &[("UserClient.java", source)]);
        let method = snapshot
            .node(&EntityKey::method("com.acme.client.UserClient", "users", 0))
            .unwrap();
        let route = method.routes.iter().next().unwrap();
        assert_eq!(route.kind, RouteKind::RetrofitClient);
        assert_eq!(route.to_string(), "GET users");
    }

    #[test]
    fn test_ignored_owners_are_not_recorded() {
        let source = r#"
class A {
    void foo() {
        java.util.Objects.requireNonNull(this);
        B.bar();
    }
}
"#;
        let java = JavaDialect::new();
        let resolver = EntityResolver::new().with_ignored_owners(vec!["java.".to_string()]);
        let (snapshot, stats) = walk_with(resolver, &java, &[("A.java", source)]);
        assert_eq!(stats.ignored, 1);
        assert_eq!(snapshot.edges.len(), 1);
        assert!(snapshot.is_closed());
    }

    #[test]
    fn test_kotlin_unit() {
        let source = r#"
package com.acme

class OrderService(private val repo: OrderRepository) {
    fun place(id: Long) {
        repo.save(id)
        val order = Order(id)
        audit(order)
    }
}

fun audit(order: Order) {}
"#;
        let kotlin = KotlinDialect::new();
        let (snapshot, stats) = walk(&kotlin, &[("src/OrderService.kt", source)]);

        assert!(snapshot.node(&EntityKey::class("com.acme.OrderService")).is_some());
        assert!(snapshot.node(&EntityKey::method("com.acme.OrderServiceKt", "audit", 1)).unwrap().declared);
        assert_eq!(
            edge_lines(&snapshot),
            vec![
                "method:com.acme.OrderService.place(1) calls method:com.acme.OrderRepository.save(1)",
                "method:com.acme.OrderService.place(1) calls method:com.acme.OrderServiceKt.audit(1)",
                "method:com.acme.OrderService.place(1) instantiates class:com.acme.Order",
            ]
        );
        assert!(snapshot.edges.iter().all(|e| e.confidence == Confidence::High));
        assert_eq!(stats.calls, 2);
        assert_eq!(stats.instantiations, 1);
        assert!(snapshot.is_closed());
    }

    #[test]
    fn test_kotlin_initializers_are_unscoped() {
        let source = r#"
package com.acme

val registry = Registry()

class OrderService {
    private val cache = loadCache()

    init {
        warmUp()
    }

    fun loadCache(): Int = 0

    fun warmUp() {}
}
"#;
        let kotlin = KotlinDialect::new();
        let (snapshot, stats) = walk(&kotlin, &[("OrderService.kt", source)]);

        assert_eq!(
            edge_lines(&snapshot),
            vec![
                "method:<unscoped> calls method:com.acme.OrderService.loadCache(0)",
                "method:<unscoped> calls method:com.acme.OrderService.warmUp(0)",
                "method:<unscoped> instantiates class:com.acme.Registry",
            ]
        );
        assert_eq!(stats.unscoped, 3);
    }

    #[test]
    fn test_companion_shares_enclosing_class() {
        let source = r#"
package com.acme

class OrderService {
    private val first = object : Runnable {
        override fun run() {}
    }

    companion object {
        private val second = object : Runnable {
            override fun run() {}
        }

        fun create(): OrderService = OrderService()
    }

    fun start() {
        create()
    }
}
"#;
        let kotlin = KotlinDialect::new();
        let (snapshot, _) = walk(&kotlin, &[("OrderService.kt", source)]);

        assert!(snapshot.node(&EntityKey::class("com.acme.OrderService$1")).is_some());
        assert!(snapshot.node(&EntityKey::class("com.acme.OrderService$2")).is_some());
        assert!(snapshot.node(&EntityKey::method("com.acme.OrderService$1", "run", 0)).is_some());
        assert!(snapshot.node(&EntityKey::method("com.acme.OrderService$2", "run", 0)).is_some());
        assert!(snapshot.node(&EntityKey::class("com.acme.OrderService$Companion")).is_none());

        let create = snapshot
            .edges
            .iter()
            .find(|e| e.target.to_key_string() == "method:com.acme.OrderService.create(0)")
            .unwrap();
        assert_eq!(create.source.to_key_string(), "method:com.acme.OrderService.start(0)");
        assert_eq!(create.confidence, Confidence::High);
        assert!(has_edge(&snapshot, "method:com.acme.OrderService.create(0)", EdgeKind::Instantiates, "class:com.acme.OrderService"));
    }

    #[test]
    fn test_object_literal_instantiates_supertype() {
        let source = r#"
package com.acme

class Worker {
    fun start() {
        val task = object : Runnable {
            override fun run() {}
        }
    }
}
"#;
        let kotlin = KotlinDialect::new();
        let (snapshot, stats) = walk(&kotlin, &[("Worker.kt", source)]);
        assert!(has_edge(&snapshot, "method:com.acme.Worker.start(0)", EdgeKind::Instantiates, "class:java.lang.Runnable"));
        assert!(snapshot.node(&EntityKey::method("com.acme.Worker$1", "run", 0)).is_some());
        assert_eq!(stats.instantiations, 1);
    }

    #[test]
    fn test_event_processor_wiring() {
        let source = r#"
package com.acme

import com.borrowbox.gearbox.sqs.eventprocessor.domain.EventProcessorConfiguration
import com.borrowbox.gearbox.sqs.eventprocessor.processor.EventProcessor
import org.springframework.beans.factory.annotation.Qualifier
import org.springframework.context.annotation.Bean

class MyConfiguration {
    @Bean(value = ["myEventConfig"])
    fun myEventConfiguration() =
        EventProcessorConfiguration(enabled = true, queueUrl = "myQueueUrl", waitTimeInSeconds = 10)
}

class MyEventHandler(
    sqsClient: SqsClient,
    @Qualifier("myEventConfig")
    configuration: EventProcessorConfiguration,
    val myService: MyService
) {
    private val processor = EventProcessor(
        sqsClient = sqsClient,
        configuration = configuration,
        handleEvent = this::handleEvent,
    )

    fun handleEvent(event: MyEvent) {
        myService.doX()
    }
}
"#;
        let kotlin = KotlinDialect::new();
        let (snapshot, _) = walk(&kotlin, &[("MyEventHandler.kt", source)]);

        let factory = snapshot
            .node(&EntityKey::method("com.acme.MyConfiguration", "myEventConfiguration", 0))
            .unwrap();
        assert_eq!(
            factory.configs.iter().collect::<Vec<_>>(),
            vec![&EventConfig::new("myEventConfig", Some("myQueueUrl".into()))]
        );

        let handler = snapshot.node(&EntityKey::class("com.acme.MyEventHandler")).unwrap();
        assert!(handler.declared);
        assert_eq!(
            handler.configs.iter().collect::<Vec<_>>(),
            vec![&EventConfig::new("myEventConfig", None)]
        );
        assert!(snapshot.node(&EntityKey::method("com.acme.MyEventHandler", "handleEvent", 1)).unwrap().configs.is_empty());
    }
}
