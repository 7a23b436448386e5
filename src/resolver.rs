//! Entity Resolver - Maps declarations and call sites to identity keys
//!
//! Resolution algorithm for a call target:
//! 1. Determine the owner type from the receiver and the unit's type environment
//! 2. If the owner is known → `owner.name(arity)` with high confidence
//! 3. If the owner is only a guess (a single static wildcard import) → `owner.name(arity)`
//!    with low confidence
//! 4. Otherwise → `<unresolved>.name(arity)` with low confidence
//!
//! Declarations always resolve exactly, since the walker knows their enclosing type.

use crate::adapter::{Instantiation, Invocation, Receiver};
use crate::adapter::DialectKind;
use crate::edge::Confidence;
use crate::identity::{EntityKey, EntityKind};
use crate::scope::{ScopeStack, TypeEnvironment, TypeRef};

/// Result of resolving a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: EntityKey,
    pub confidence: Confidence,
}

impl Resolution {
    fn exact(key: EntityKey) -> Self {
        Self {
            key,
            confidence: Confidence::High,
        }
    }

    fn fallback(key: EntityKey) -> Self {
        Self {
            key,
            confidence: Confidence::Low,
        }
    }
}

/// Resolver of identity keys, shared by every walker of a scan
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    ignored_owner_prefixes: Vec<String>,
}

impl EntityResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip targets whose owner starts with any of `prefixes`
    pub fn with_ignored_owners(mut self, prefixes: impl IntoIterator<Item = String>) -> Self {
        self.ignored_owner_prefixes = prefixes.into_iter().filter(|p| !p.is_empty()).collect();
        self
    }

    /// Key of a method declared on `owner`
    pub fn method_declaration(&self, owner: &str, name: &str, arity: usize) -> EntityKey {
        EntityKey::method(owner, name, arity)
    }

    /// Key of a class referenced by a type name as written
    pub fn class_reference(&self, env: &TypeEnvironment, raw: &str) -> Resolution {
        match env.qualify(raw) {
            TypeRef::Known(name) => Resolution::exact(EntityKey::class(name)),
            TypeRef::Ambiguous(name) => Resolution::fallback(EntityKey::unresolved_class(&name)),
        }
    }

    /// Target of an object construction site
    pub fn resolve_instantiation(&self, env: &TypeEnvironment, site: &Instantiation) -> Resolution {
        self.class_reference(env, &site.type_name)
    }

    /// Target of a method invocation site
    pub fn resolve_invocation(
        &self,
        env: &TypeEnvironment,
        stack: &ScopeStack,
        site: &Invocation,
    ) -> Resolution {
        let exact = |owner: Option<String>| owner.map(|o| (o, Confidence::High));
        let owner = match &site.receiver {
            Receiver::None => self.bare_call_owner(env, stack, &site.name),
            Receiver::This => exact(stack.current_class().map(|c| c.qualified_name.clone())),
            Receiver::Super => exact(stack.current_class().and_then(|c| c.superclass.clone())),
            Receiver::Name(path) => exact(self.path_owner(env, path)),
            Receiver::Expression => None,
        };

        match owner {
            Some((owner, confidence)) => Resolution {
                key: EntityKey::method(&owner, &site.name, site.arg_count),
                confidence,
            },
            None => Resolution::fallback(EntityKey::unresolved_method(&site.name, site.arg_count)),
        }
    }

    /// Check whether a target should be left out of the model
    pub fn is_ignored(&self, key: &EntityKey) -> bool {
        if self.ignored_owner_prefixes.is_empty() {
            return false;
        }
        let owner = match key.kind {
            EntityKind::Class => Some(key.qualified_name.as_str()),
            EntityKind::Method => key.owner(),
        };
        owner.is_some_and(|owner| {
            self.ignored_owner_prefixes
                .iter()
                .any(|prefix| owner.starts_with(prefix.as_str()))
        })
    }

    /// Owner of a call without receiver. Only a declaring enclosing class, an
    /// explicit static import or a same-file top-level function is exact.
    fn bare_call_owner(
        &self,
        env: &TypeEnvironment,
        stack: &ScopeStack,
        name: &str,
    ) -> Option<(String, Confidence)> {
        if env.dialect() == DialectKind::Java {
            if let Some(owner) = env.static_import_owner(name) {
                return Some((owner.to_string(), Confidence::High));
            }
        }

        let mut classes = stack.classes();
        if let Some(declaring) = classes.find(|c| env.declares_method(&c.qualified_name, name)) {
            return Some((declaring.qualified_name.clone(), Confidence::High));
        }

        match env.dialect() {
            // inherited members and wildcard members are indistinguishable here
            DialectKind::Java => env
                .single_static_wildcard()
                .map(|owner| (owner.to_string(), Confidence::Low)),
            DialectKind::Kotlin => env
                .facade()
                .filter(|_| env.has_top_level_function(name))
                .map(|owner| (owner.to_string(), Confidence::High)),
        }
    }

    fn path_owner(&self, env: &TypeEnvironment, path: &str) -> Option<String> {
        let path = path.strip_prefix("this.").unwrap_or(path);
        let segments: Vec<&str> = path.split('.').collect();

        if let [single] = segments.as_slice() {
            if let Some(variable) = env.variable(single) {
                return variable.known().map(str::to_string);
            }
            if single.starts_with(char::is_uppercase) {
                return env.qualify(single).known().map(str::to_string);
            }
            return None;
        }

        if env.variable(segments[0]).is_some() {
            return None;
        }
        // package segments, then type segments, nothing after
        let first_type = segments.iter().position(|s| s.starts_with(char::is_uppercase))?;
        if segments[first_type..]
            .iter()
            .any(|s| !s.starts_with(char::is_uppercase))
        {
            return None;
        }
        env.qualify(path).known().map(str::to_string)
    }
}
