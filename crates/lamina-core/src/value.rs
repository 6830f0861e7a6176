//! Runtime values held by series cells

use std::fmt;
use std::sync::Arc;

use crate::types::{self, TypeRef};

/// Declared element kind of a series.
///
/// `Obj` is the catch-all for caller-typed payloads, sequences and mixed
/// columns; the other kinds promise a homogeneous column of that scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// 32-bit signed integers
    Int,
    /// 64-bit signed integers
    Long,
    /// 64-bit floating-point numbers
    Double,
    /// Booleans
    Bool,
    /// Strings
    Str,
    /// Anything else: sequences, caller-typed objects, mixed columns
    Obj,
}

impl Kind {
    /// Get the kind name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Kind::Int => "Int",
            Kind::Long => "Long",
            Kind::Double => "Double",
            Kind::Bool => "Bool",
            Kind::Str => "Str",
            Kind::Obj => "Obj",
        }
    }

    /// Whether columns of this kind hold numbers
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Long | Kind::Double)
    }
}

/// An opaque payload carrying a caller-supplied runtime type.
///
/// The engine never interprets the payload; it only compares it for equality
/// and feeds its type into inference.
#[derive(Debug)]
pub struct Obj {
    ty: TypeRef,
    repr: Arc<str>,
}

impl Obj {
    /// Create a payload of the given runtime type.
    #[must_use]
    pub fn new(ty: TypeRef, repr: impl AsRef<str>) -> Self {
        Self {
            ty,
            repr: Arc::from(repr.as_ref()),
        }
    }

    /// The payload's runtime type.
    #[must_use]
    pub fn runtime_type(&self) -> &TypeRef {
        &self.ty
    }

    /// The opaque payload text.
    #[must_use]
    pub fn repr(&self) -> &str {
        &self.repr
    }
}

impl PartialEq for Obj {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.repr == other.repr
    }
}

/// A single cell value.
///
/// Equality is strict per variant: `Int(1)` and `Long(1)` are not equal, and
/// `Null` equals only `Null`. Payloads are reference-counted so values stay
/// cheap to clone and safe to move across worker threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean value
    Bool(bool),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// 64-bit floating-point number
    Double(f64),

    /// String (reference-counted)
    Str(Arc<str>),

    /// Sequence of values (reference-counted)
    List(Arc<Vec<Value>>),

    /// Caller-typed opaque payload
    Obj(Arc<Obj>),
}

impl Value {
    /// Create a string value
    #[must_use]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Create a sequence value
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    /// Create a caller-typed object value
    #[must_use]
    pub fn object(ty: TypeRef, repr: impl AsRef<str>) -> Self {
        Value::Obj(Arc::new(Obj::new(ty, repr)))
    }

    /// Check whether this is the null value
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the value's kind tag, or `None` for null
    #[must_use]
    pub fn kind(&self) -> Option<Kind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(Kind::Bool),
            Value::Int(_) => Some(Kind::Int),
            Value::Long(_) => Some(Kind::Long),
            Value::Double(_) => Some(Kind::Double),
            Value::Str(_) => Some(Kind::Str),
            Value::List(_) | Value::Obj(_) => Some(Kind::Obj),
        }
    }

    /// Get the value's type name for error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Str(_) => "Str",
            Value::List(_) => "List",
            Value::Obj(_) => "Obj",
        }
    }

    /// Get the value's runtime type, or `None` for null.
    ///
    /// Scalar variants map onto the built-in hierarchy; object payloads
    /// report whatever type their caller attached.
    #[must_use]
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(types::boolean()),
            Value::Int(_) => Some(types::integer()),
            Value::Long(_) => Some(types::long()),
            Value::Double(_) => Some(types::double()),
            Value::Str(_) => Some(types::text()),
            Value::List(_) => Some(types::sequence()),
            Value::Obj(obj) => Some(obj.runtime_type().clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Obj(obj) => write!(f, "{}", obj.repr()),
        }
    }
}
