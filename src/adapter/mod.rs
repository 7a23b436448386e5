//! Dialect Framework
//!
//! Each dialect provides a tree-sitter grammar and a classifier that maps its
//! nodes onto one unified node enumeration. The walker never sees
//! grammar-specific node kinds.

pub mod framework;
pub mod java;
pub mod kotlin;

pub use framework::{
    default_registry, Annotation, ArgumentValue, Binding, ClassDecl, Dialect, DialectKind,
    DialectRegistry, ImportDecl, Instantiation, Invocation, MethodDecl, Receiver, SyntaxNode,
};
pub use java::JavaDialect;
pub use kotlin::KotlinDialect;
