//! Scope tracking - Lexical context for resolution
//!
//! The walker owns one [`ScopeStack`] and one [`TypeEnvironment`] per
//! compilation unit. The stack answers "which declaration encloses this call?";
//! the environment answers "what does this name refer to?".

pub mod stack;
pub mod types;

pub use stack::{ClassFrame, Frame, MethodFrame, ScopeStack};
pub use types::{TypeEnvironment, TypeRef};
