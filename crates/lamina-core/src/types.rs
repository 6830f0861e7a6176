//! Runtime type hierarchy and common-ancestor computation
//!
//! Values carry a runtime type drawn from a single-parent hierarchy rooted at
//! [`object`]. Series type inference walks superclass chains to find the
//! narrowest type shared by every non-null element.

use std::fmt;
use std::sync::{Arc, OnceLock};

/// A node in the runtime type hierarchy.
///
/// `TypeRef` has identity semantics: two references are equal only when they
/// point at the same node. Cloning is cheap (reference-counted).
#[derive(Clone)]
pub struct TypeRef(Arc<TypeNode>);

struct TypeNode {
    name: String,
    parent: Option<TypeRef>,
}

impl TypeRef {
    /// Create a new hierarchy root.
    ///
    /// Roots other than [`object`] are still joined at [`object`] by
    /// [`common_ancestor`], which treats it as the universal ancestor.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self(Arc::new(TypeNode {
            name: name.into(),
            parent: None,
        }))
    }

    /// Create a direct subtype of this type.
    #[must_use]
    pub fn subtype(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(TypeNode {
            name: name.into(),
            parent: Some(self.clone()),
        }))
    }

    /// Get the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Get the direct superclass, if any.
    #[must_use]
    pub fn superclass(&self) -> Option<&TypeRef> {
        self.0.parent.as_ref()
    }

    /// The superclass chain from this type (inclusive) up to its root.
    fn chain(&self) -> Vec<TypeRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.clone();
        while let Some(parent) = current.superclass().cloned() {
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeRef {}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.0.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

static OBJECT: OnceLock<TypeRef> = OnceLock::new();
static NUMBER: OnceLock<TypeRef> = OnceLock::new();
static INTEGER: OnceLock<TypeRef> = OnceLock::new();
static LONG: OnceLock<TypeRef> = OnceLock::new();
static DOUBLE: OnceLock<TypeRef> = OnceLock::new();
static BOOLEAN: OnceLock<TypeRef> = OnceLock::new();
static TEXT: OnceLock<TypeRef> = OnceLock::new();
static SEQUENCE: OnceLock<TypeRef> = OnceLock::new();

/// The universal root type.
#[must_use]
pub fn object() -> TypeRef {
    OBJECT.get_or_init(|| TypeRef::root("Object")).clone()
}

/// Common superclass of the numeric types.
#[must_use]
pub fn number() -> TypeRef {
    NUMBER.get_or_init(|| object().subtype("Number")).clone()
}

/// Runtime type of 32-bit integer values.
#[must_use]
pub fn integer() -> TypeRef {
    INTEGER.get_or_init(|| number().subtype("Integer")).clone()
}

/// Runtime type of 64-bit integer values.
#[must_use]
pub fn long() -> TypeRef {
    LONG.get_or_init(|| number().subtype("Long")).clone()
}

/// Runtime type of floating-point values.
#[must_use]
pub fn double() -> TypeRef {
    DOUBLE.get_or_init(|| number().subtype("Double")).clone()
}

/// Runtime type of boolean values.
#[must_use]
pub fn boolean() -> TypeRef {
    BOOLEAN.get_or_init(|| object().subtype("Boolean")).clone()
}

/// Runtime type of string values.
#[must_use]
pub fn text() -> TypeRef {
    TEXT.get_or_init(|| object().subtype("Text")).clone()
}

/// Runtime type of sequence (list) values.
#[must_use]
pub fn sequence() -> TypeRef {
    SEQUENCE.get_or_init(|| object().subtype("Sequence")).clone()
}

/// Compute the narrowest type shared by every input.
///
/// Zero inputs produce [`object`]. The fold short-circuits once it collapses
/// to [`object`], since no further input can narrow the result again.
#[must_use]
pub fn common_ancestor<I>(types: I) -> TypeRef
where
    I: IntoIterator<Item = TypeRef>,
{
    let mut iter = types.into_iter();
    let Some(first) = iter.next() else {
        return object();
    };

    let root = object();
    let mut acc = first;
    for ty in iter {
        if acc == root {
            break;
        }
        acc = join(&acc, &ty);
    }
    acc
}

/// Most-recent common ancestor of two types.
///
/// Climbs `b`'s superclass chain from most-specific upward and takes the
/// first node that also appears in `a`'s chain. Unrelated hierarchies join
/// at [`object`].
fn join(a: &TypeRef, b: &TypeRef) -> TypeRef {
    if a == b {
        return a.clone();
    }

    let left = a.chain();
    let mut candidate = Some(b.clone());
    while let Some(ty) = candidate {
        if left.contains(&ty) {
            return ty;
        }
        candidate = ty.superclass().cloned();
    }
    object()
}
