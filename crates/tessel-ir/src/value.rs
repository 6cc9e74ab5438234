//! Runtime values produced and consumed by statements, and the faults
//! raised by code under test.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{PrimitiveKind, Type};

/// Category of a fault, used for failure classification and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    NullPointer,
    Assertion,
    StackOverflow,
    OutOfMemory,
    Timeout,
    Other,
}

/// An exception thrown by the code under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Fully-qualified exception class name.
    pub class_name: String,
    pub message: Option<String>,
    pub kind: FaultKind,
}

impl Fault {
    pub fn new(class_name: &str, message: Option<&str>) -> Self {
        let kind = match class_name {
            "java.lang.NullPointerException" => FaultKind::NullPointer,
            "java.lang.AssertionError" => FaultKind::Assertion,
            "java.lang.StackOverflowError" => FaultKind::StackOverflow,
            "java.lang.OutOfMemoryError" => FaultKind::OutOfMemory,
            "java.lang.ThreadDeath" | "java.util.concurrent.TimeoutException" => {
                FaultKind::Timeout
            }
            _ => FaultKind::Other,
        };
        Self {
            class_name: class_name.to_string(),
            message: message.map(str::to_string),
            kind,
        }
    }

    pub fn null_pointer() -> Self {
        Self::new("java.lang.NullPointerException", None)
    }

    /// The statement exceeded its wall-clock budget and was interrupted.
    pub fn timeout(limit_ms: u64) -> Self {
        Self {
            class_name: "java.lang.ThreadDeath".to_string(),
            message: Some(format!("statement exceeded {limit_ms} ms")),
            kind: FaultKind::Timeout,
        }
    }

    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(self.kind, FaultKind::StackOverflow | FaultKind::OutOfMemory)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.class_name, msg),
            None => f.write_str(&self.class_name),
        }
    }
}

/// A live object owned by the execution backend.
///
/// The three `java.lang.Object` protocol methods may themselves throw, which
/// is exactly what the object contracts probe for.
pub trait RuntimeObject: fmt::Debug + Send + Sync {
    fn runtime_type(&self) -> Type;

    fn equals(&self, other: &Value) -> Result<bool, Fault>;

    fn hash_code(&self) -> Result<i32, Fault>;

    fn to_display_string(&self) -> Result<String, Fault>;

    fn as_any(&self) -> &dyn Any;
}

/// An array value built by an array-creation statement.
#[derive(Debug, Clone)]
pub struct ArrayValue {
    pub element: Type,
    pub items: Vec<Value>,
}

/// A value produced by an executed statement.
#[derive(Debug, Clone)]
pub enum Value {
    /// Result of a void call.
    Void,
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    Array(Arc<ArrayValue>),
    Object(Arc<dyn RuntimeObject>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn object<T: RuntimeObject + 'static>(obj: T) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::Byte(_) => Some(PrimitiveKind::Byte),
            Value::Short(_) => Some(PrimitiveKind::Short),
            Value::Int(_) => Some(PrimitiveKind::Int),
            Value::Long(_) => Some(PrimitiveKind::Long),
            Value::Float(_) => Some(PrimitiveKind::Float),
            Value::Double(_) => Some(PrimitiveKind::Double),
            _ => None,
        }
    }

    /// Primitive (boxed or not) or string.
    pub fn is_primitive_like(&self) -> bool {
        self.primitive_kind().is_some() || matches!(self, Value::Str(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn RuntimeObject>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Downcast an object value to the backend's concrete type.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Identity for objects and arrays, value equality otherwise.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}
