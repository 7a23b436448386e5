//! Classifiers - Attach framework facts to declarations and construction sites
//!
//! Three hooks, each run in registration order with the first answer winning:
//! - Method classifiers look at the annotations of a method and of its enclosing
//!   class and return the HTTP routes the method serves or calls
//! - Bean factory classifiers look at `@Bean` methods and return the event
//!   processor configurations they produce
//! - Construction classifiers look at `new T(...)` sites and return the
//!   configuration the enclosing class wires into the constructed object

pub mod endpoint;
pub mod event;
pub mod retrofit;

pub use endpoint::SpringEndpointClassifier;
pub use event::{EventProcessorConfigClassifier, EventProcessorConstructionClassifier};
pub use retrofit::RetrofitClientClassifier;

use crate::adapter::{Annotation, Binding, Instantiation};
use crate::entity::{EventConfig, Route};

pub const BEAN: &str = "org.springframework.context.annotation.Bean";

/// What a classifier can see of a method declaration
#[derive(Debug, Clone, Copy)]
pub struct MethodContext<'a> {
    pub class_annotations: &'a [Annotation],
    pub method_annotations: &'a [Annotation],
    pub name: &'a str,
    /// Parameters with resolved annotations
    pub parameters: &'a [Binding],
    /// Qualified candidates of the declared return type and of the returned construction
    pub return_types: &'a [String],
    pub returned: Option<&'a Instantiation>,
}

impl<'a> MethodContext<'a> {
    pub fn new(class_annotations: &'a [Annotation], method_annotations: &'a [Annotation]) -> Self {
        Self {
            class_annotations,
            method_annotations,
            name: "",
            parameters: &[],
            return_types: &[],
            returned: None,
        }
    }

    pub fn with_signature(mut self, name: &'a str, parameters: &'a [Binding]) -> Self {
        self.name = name;
        self.parameters = parameters;
        self
    }

    pub fn with_returns(mut self, return_types: &'a [String], returned: Option<&'a Instantiation>) -> Self {
        self.return_types = return_types;
        self.returned = returned;
        self
    }

    /// First class annotation resolving to `qualified_name`
    pub fn class_annotation(&self, qualified_name: &str) -> Option<&'a Annotation> {
        self.class_annotations.iter().find(|a| a.is(qualified_name))
    }

    /// First method annotation resolving to `qualified_name`
    pub fn method_annotation(&self, qualified_name: &str) -> Option<&'a Annotation> {
        self.method_annotations.iter().find(|a| a.is(qualified_name))
    }

    pub fn parameter(&self, name: &str) -> Option<&'a Binding> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn returns(&self, qualified_name: &str) -> bool {
        self.return_types.iter().any(|t| t == qualified_name)
    }
}

/// What a classifier can see of an object construction site
#[derive(Debug, Clone, Copy)]
pub struct ConstructionContext<'a> {
    pub site: &'a Instantiation,
    /// Qualified candidates of the constructed type
    pub type_candidates: &'a [String],
    /// Fields, properties and constructor parameters of the enclosing class
    pub class_members: &'a [Binding],
}

impl<'a> ConstructionContext<'a> {
    pub fn constructs(&self, qualified_name: &str) -> bool {
        self.type_candidates.iter().any(|t| t == qualified_name)
    }

    pub fn member(&self, name: &str) -> Option<&'a Binding> {
        self.class_members.iter().find(|m| m.name == name)
    }
}

/// Trait for method classifiers
pub trait MethodClassifier: Send + Sync {
    /// Routes for the method, empty when the classifier does not apply
    fn classify(&self, method: &MethodContext<'_>) -> Vec<Route>;
}

/// Trait for classifiers of `@Bean` factory methods
pub trait BeanFactoryClassifier: Send + Sync {
    /// Configurations the bean method produces, empty when it does not apply
    fn classify(&self, method: &MethodContext<'_>) -> Vec<EventConfig>;
}

/// Trait for classifiers of object construction sites
pub trait ConstructionClassifier: Send + Sync {
    fn classify(&self, site: &ConstructionContext<'_>) -> Option<EventConfig>;
}

/// Ordered sets of classifiers
#[derive(Default)]
pub struct ClassifierRegistry {
    methods: Vec<Box<dyn MethodClassifier>>,
    bean_factories: Vec<Box<dyn BeanFactoryClassifier>>,
    constructions: Vec<Box<dyn ConstructionClassifier>>,
}

impl ClassifierRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method classifier
    pub fn register(&mut self, classifier: impl MethodClassifier + 'static) {
        self.methods.push(Box::new(classifier));
    }

    pub fn register_bean_factory(&mut self, classifier: impl BeanFactoryClassifier + 'static) {
        self.bean_factories.push(Box::new(classifier));
    }

    pub fn register_construction(&mut self, classifier: impl ConstructionClassifier + 'static) {
        self.constructions.push(Box::new(classifier));
    }

    /// Routes from the first classifier that recognizes the method
    pub fn classify(&self, method: &MethodContext<'_>) -> Vec<Route> {
        if method.method_annotations.is_empty() {
            return Vec::new();
        }
        self.methods
            .iter()
            .map(|c| c.classify(method))
            .find(|routes| !routes.is_empty())
            .unwrap_or_default()
    }

    /// Configurations from the first bean factory classifier that recognizes a
    /// `@Bean` method
    pub fn classify_bean_factory(&self, method: &MethodContext<'_>) -> Vec<EventConfig> {
        if method.method_annotation(BEAN).is_none() {
            return Vec::new();
        }
        self.bean_factories
            .iter()
            .map(|c| c.classify(method))
            .find(|configs| !configs.is_empty())
            .unwrap_or_default()
    }

    pub fn classify_construction(&self, site: &ConstructionContext<'_>) -> Option<EventConfig> {
        self.constructions.iter().find_map(|c| c.classify(site))
    }
}

/// Create a registry with the built-in classifiers
pub fn default_classifiers() -> ClassifierRegistry {
    let mut registry = ClassifierRegistry::new();
    registry.register(SpringEndpointClassifier);
    registry.register(RetrofitClientClassifier);
    registry.register_bean_factory(EventProcessorConfigClassifier);
    registry.register_construction(EventProcessorConstructionClassifier);
    registry
}

/// Last segment of an enum constant reference: `RequestMethod.GET` → `GET`
pub(crate) fn enum_constant(value: &str) -> &str {
    value.rsplit('.').next().unwrap_or(value)
}
