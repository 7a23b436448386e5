//! # Microscope - Call graphs for JVM microservices
//!
//! Walks Java and Kotlin syntax trees and builds a knowledge graph of which
//! methods exist, which classes exist, which methods call which, and which
//! classes get instantiated where.
//!
//! Microscope provides:
//! - Stable identity keys for classes and methods, with a low-confidence fallback
//! - A deduplicating, thread-safe knowledge model shared by every walker of a scan
//! - Tree-sitter based front-ends behind one unified node enumeration
//! - Spring endpoint and Retrofit client classification of methods
//! - Event processor configuration beans and the classes that consume them
//! - A deterministic Turtle serializer and a reader for its output

pub mod identity;
pub mod entity;
pub mod edge;
pub mod model;
pub mod scope;
pub mod resolver;
pub mod adapter;
pub mod walker;
pub mod classify;
pub mod serialize;
pub mod scan;
pub mod ignore;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use identity::{EntityKey, EntityKind};
pub use entity::{Entity, EventConfig, Route, RouteKind};
pub use edge::{Confidence, Edge, EdgeKind};
pub use model::{KnowledgeModel, ModelStats, NodeHandle, Snapshot};
pub use walker::{Walker, WalkStats};
pub use scan::{ScanOptions, ScanReport, Scanner};
pub use serialize::{Namespaces, TurtleReader, TurtleWriter};

/// Result type alias for Microscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Microscope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Turtle error at line {line}: {message}")]
    Turtle { line: usize, message: String },

    #[error("Scan cancelled")]
    Cancelled,
}
