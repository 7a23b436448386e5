//! Identity keys - Stable, deterministic identity for every graph node
//!
//! Format: `<kind>:<qualified name>[(<arity>)]`
//!
//! Examples:
//! - `class:com.acme.Order`
//! - `class:com.acme.Outer$Inner`
//! - `method:com.acme.Order.total(2)`
//! - `method:com.acme.Order.<init>(0)`
//! - `method:<unresolved>.total(2)` (fallback when the owner is unknown)
//! - `method:<unscoped>` (synthetic caller for code outside any method)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Owner placeholder used when a call target's declaring type cannot be determined.
pub const UNRESOLVED_OWNER: &str = "<unresolved>";

/// Qualified name of the synthetic root that sources unscoped edges.
pub const UNSCOPED_ROOT: &str = "<unscoped>";

/// Name given to constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// The two kinds of declaration the graph knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Class, interface, enum, record, object
    Class,
    /// Method, function, constructor
    Method,
}

impl EntityKind {
    /// Get the string representation of the entity kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Method => "method",
        }
    }

    /// Local name used for the RDF class of this kind
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Class => "Class",
            EntityKind::Method => "Method",
        }
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "class" | "interface" | "enum" | "record" | "object" => Ok(EntityKind::Class),
            "method" | "function" | "fun" | "constructor" => Ok(EntityKind::Method),
            _ => Err(Error::InvalidKey(format!("Unknown entity kind: {}", s))),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical identity of a class or method.
///
/// Two observations of the same declaration, from any file and in any order,
/// must produce equal keys. This is what makes node deduplication work.
///
/// The `signature` of a method is its parameter count. Call sites know how many
/// arguments they pass but not their types, so arity is the only descriptor
/// both sides agree on. Overloads of equal arity share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    /// Owner-qualified name: `com.acme.Order` or `com.acme.Order.total`
    pub qualified_name: String,
    /// Parameter count for methods; `None` for classes and the unscoped root
    pub signature: Option<u16>,
}

impl EntityKey {
    /// Key for a class given its fully qualified name
    pub fn class(qualified_name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Class,
            qualified_name: qualified_name.into(),
            signature: None,
        }
    }

    /// Key for a method declared on `owner`
    pub fn method(owner: &str, name: &str, arity: usize) -> Self {
        let qualified_name = if owner.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", owner, name)
        };
        Self {
            kind: EntityKind::Method,
            qualified_name,
            signature: Some(clamp_arity(arity)),
        }
    }

    /// Fallback key for a call target whose owner could not be resolved
    pub fn unresolved_method(name: &str, arity: usize) -> Self {
        Self::method(UNRESOLVED_OWNER, name, arity)
    }

    /// Fallback key for a class reference that could not be qualified
    pub fn unresolved_class(simple_name: &str) -> Self {
        Self::class(format!("{}.{}", UNRESOLVED_OWNER, simple_name))
    }

    /// The synthetic root that sources calls made outside any method body
    pub fn unscoped_root() -> Self {
        Self {
            kind: EntityKind::Method,
            qualified_name: UNSCOPED_ROOT.to_string(),
            signature: None,
        }
    }

    pub fn is_unscoped_root(&self) -> bool {
        self.kind == EntityKind::Method && self.qualified_name == UNSCOPED_ROOT
    }

    /// Owner part of a method key (`com.acme.Order` for `com.acme.Order.total`)
    pub fn owner(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Method if !self.is_unscoped_root() => {
                split_member(&self.qualified_name).map(|(owner, _)| owner)
            }
            _ => None,
        }
    }

    /// Simple name: method name, or the last segment of a class name
    pub fn simple_name(&self) -> &str {
        match self.kind {
            EntityKind::Method => split_member(&self.qualified_name)
                .map(|(_, name)| name)
                .unwrap_or(&self.qualified_name),
            EntityKind::Class => {
                let tail = self
                    .qualified_name
                    .rsplit('.')
                    .next()
                    .unwrap_or(&self.qualified_name);
                tail.rsplit('$').next().unwrap_or(tail)
            }
        }
    }

    /// Parse a key string
    ///
    /// Expected format: `<kind>:<qualified name>[(<arity>)]`
    pub fn parse(key: &str) -> Result<Self> {
        let (kind_str, rest) = key
            .split_once(':')
            .ok_or_else(|| Error::InvalidKey(format!("Key must contain kind prefix: {}", key)))?;
        let kind = EntityKind::from_str(kind_str)?;

        let (qualified_name, signature) = match rest.strip_suffix(')') {
            Some(body) => {
                let (name, arity) = body
                    .rsplit_once('(')
                    .ok_or_else(|| Error::InvalidKey(format!("Unbalanced signature: {}", key)))?;
                let arity: u16 = arity
                    .parse()
                    .map_err(|_| Error::InvalidKey(format!("Invalid arity: {}", arity)))?;
                (name, Some(arity))
            }
            None => (rest, None),
        };

        if qualified_name.is_empty() {
            return Err(Error::InvalidKey(format!("Empty qualified name: {}", key)));
        }
        if kind == EntityKind::Class && signature.is_some() {
            return Err(Error::InvalidKey(format!("Classes carry no signature: {}", key)));
        }

        Ok(Self {
            kind,
            qualified_name: qualified_name.to_string(),
            signature,
        })
    }

    /// Convert to key string
    pub fn to_key_string(&self) -> String {
        match self.signature {
            Some(arity) => format!("{}:{}({})", self.kind.as_str(), self.qualified_name, arity),
            None => format!("{}:{}", self.kind.as_str(), self.qualified_name),
        }
    }
}

fn clamp_arity(arity: usize) -> u16 {
    u16::try_from(arity).unwrap_or(u16::MAX)
}

/// Split `owner.member` at the last dot that is not inside `<...>`.
fn split_member(qualified: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    for (idx, ch) in qualified.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => depth -= 1,
            '.' if depth == 0 => return Some((&qualified[..idx], &qualified[idx + 1..])),
            _ => {}
        }
    }
    None
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}

impl FromStr for EntityKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for EntityKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_key_string())
    }
}

impl<'de> Deserialize<'de> for EntityKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntityKey::parse(&s).map_err(serde::de::Error::custom)
    }
}
