//! Scope stack for context propagation during a depth-first walk
//!
//! Frames are pushed on entering a class or method declaration and popped on
//! leaving it. Only method frames are caller contexts: class frames carry the
//! facts the resolver and the classifiers need but are skipped when looking for
//! the enclosing method.

use crate::adapter::{Annotation, Binding};
use crate::identity::EntityKey;
use crate::model::NodeHandle;

/// An open class declaration
#[derive(Debug, Clone)]
pub struct ClassFrame {
    pub qualified_name: String,
    pub handle: NodeHandle,
    pub annotations: Vec<Annotation>,
    /// Qualified superclass, when declared and resolvable
    pub superclass: Option<String>,
    /// Fields, properties and primary-constructor parameters, annotations resolved
    pub members: Vec<Binding>,
    anonymous_count: u32,
}

impl ClassFrame {
    pub fn new(qualified_name: impl Into<String>, handle: NodeHandle) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            handle,
            annotations: Vec::new(),
            superclass: None,
            members: Vec::new(),
            anonymous_count: 0,
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_superclass(mut self, superclass: Option<String>) -> Self {
        self.superclass = superclass;
        self
    }

    pub fn with_members(mut self, members: Vec<Binding>) -> Self {
        self.members = members;
        self
    }
}

/// An open method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFrame {
    pub key: EntityKey,
    pub handle: NodeHandle,
}

#[derive(Debug, Clone)]
pub enum Frame {
    Class(ClassFrame),
    Method(MethodFrame),
}

/// Walker-owned stack of enclosing declarations.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_class(&mut self, frame: ClassFrame) {
        self.frames.push(Frame::Class(frame));
    }

    pub fn push_method(&mut self, key: EntityKey, handle: NodeHandle) {
        self.frames.push(Frame::Method(MethodFrame { key, handle }));
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The innermost open method, ignoring any class frames above it
    pub fn current_enclosing_method(&self) -> Option<&MethodFrame> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Method(method) => Some(method),
            Frame::Class(_) => None,
        })
    }

    /// The innermost open class
    pub fn current_class(&self) -> Option<&ClassFrame> {
        self.classes().next()
    }

    /// Open classes, innermost first
    pub fn classes(&self) -> impl Iterator<Item = &ClassFrame> {
        self.frames.iter().rev().filter_map(|frame| match frame {
            Frame::Class(class) => Some(class),
            Frame::Method(_) => None,
        })
    }

    /// Name for the next anonymous class of the innermost class: `Enclosing$n`
    pub fn next_anonymous_name(&mut self) -> Option<String> {
        let class = self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Class(class) => Some(class),
            Frame::Method(_) => None,
        })?;
        class.anonymous_count += 1;
        Some(format!("{}${}", class.qualified_name, class.anonymous_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::model::KnowledgeModel;

    fn handle(model: &KnowledgeModel, key: &EntityKey) -> NodeHandle {
        model.insert_or_get_node(Entity::referenced(key.clone()))
    }

    #[test]
    fn test_class_frames_are_not_callers() {
        let model = KnowledgeModel::new();
        let mut stack = ScopeStack::new();
        let class_key = EntityKey::class("com.acme.A");
        stack.push_class(ClassFrame::new("com.acme.A", handle(&model, &class_key)));

        assert!(stack.current_enclosing_method().is_none());
        assert_eq!(stack.current_class().map(|c| c.qualified_name.as_str()), Some("com.acme.A"));

        let foo = EntityKey::method("com.acme.A", "foo", 0);
        stack.push_method(foo.clone(), handle(&model, &foo));
        assert_eq!(stack.current_enclosing_method().map(|m| &m.key), Some(&foo));

        // a local class inside foo does not hide foo
        let local = EntityKey::class("com.acme.A$Local");
        stack.push_class(ClassFrame::new("com.acme.A$Local", handle(&model, &local)));
        assert_eq!(stack.current_enclosing_method().map(|m| &m.key), Some(&foo));

        stack.pop();
        stack.pop();
        assert!(stack.current_enclosing_method().is_none());
        stack.pop();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_anonymous_names_count_per_class() {
        let model = KnowledgeModel::new();
        let mut stack = ScopeStack::new();
        assert_eq!(stack.next_anonymous_name(), None);

        let key = EntityKey::class("Outer");
        stack.push_class(ClassFrame::new("Outer", handle(&model, &key)));
        assert_eq!(stack.next_anonymous_name().as_deref(), Some("Outer$1"));
        assert_eq!(stack.next_anonymous_name().as_deref(), Some("Outer$2"));

        let inner = EntityKey::class("Outer$2");
        stack.push_class(ClassFrame::new("Outer$2", handle(&model, &inner)));
        assert_eq!(stack.next_anonymous_name().as_deref(), Some("Outer$2$1"));
    }
}
