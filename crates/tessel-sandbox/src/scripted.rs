//! In-memory execution backend driven by closures.
//!
//! Stands in for reflection in tests and demos: each operation descriptor
//! maps to a handler, and operations without one get a reasonable default
//! (constructors build a `ScriptedObject`, field accesses read and write
//! its fields, enum constants are interned).

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tessel_ir::{ExecutionBackend, Fault, LiteralValue, Operation, RuntimeObject, Type, Value};

pub type Handler = Box<dyn FnMut(&[Value]) -> Result<Value, Fault> + Send>;

/// How a `ScriptedObject` answers `equals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualsMode {
    /// Equal only to itself.
    #[default]
    Identity,
    /// Equal to any object of the same type with the same fields.
    Fields,
    /// Equal to nothing, not even itself.
    Never,
}

pub struct ScriptedObject {
    ty: Type,
    fields: Mutex<BTreeMap<String, Value>>,
    equals_mode: EqualsMode,
    hash_code_fault: Option<Fault>,
    to_string_fault: Option<Fault>,
}

impl ScriptedObject {
    pub fn new(ty: &Type) -> Self {
        Self {
            ty: ty.clone(),
            fields: Mutex::new(BTreeMap::new()),
            equals_mode: EqualsMode::default(),
            hash_code_fault: None,
            to_string_fault: None,
        }
    }

    pub fn with_equals(mut self, mode: EqualsMode) -> Self {
        self.equals_mode = mode;
        self
    }

    pub fn with_field(self, name: &str, value: Value) -> Self {
        self.set_field(name, value);
        self
    }

    /// Make `hashCode()` throw.
    pub fn with_hash_code_fault(mut self, fault: Fault) -> Self {
        self.hash_code_fault = Some(fault);
        self
    }

    /// Make `toString()` throw.
    pub fn with_to_string_fault(mut self, fault: Fault) -> Self {
        self.to_string_fault = Some(fault);
        self
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    fn snapshot(&self) -> BTreeMap<String, Value> {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn address(&self) -> usize {
        self as *const Self as usize
    }
}

impl fmt::Debug for ScriptedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedObject")
            .field("ty", &self.ty)
            .field("fields", &self.snapshot())
            .field("equals_mode", &self.equals_mode)
            .finish()
    }
}

impl RuntimeObject for ScriptedObject {
    fn runtime_type(&self) -> Type {
        self.ty.clone()
    }

    fn equals(&self, other: &Value) -> Result<bool, Fault> {
        let Value::Object(obj) = other else {
            return Ok(false);
        };
        match self.equals_mode {
            EqualsMode::Never => Ok(false),
            EqualsMode::Identity => Ok(std::ptr::addr_eq(Arc::as_ptr(obj), self as *const Self)),
            EqualsMode::Fields => {
                let Some(other) = obj.as_any().downcast_ref::<ScriptedObject>() else {
                    return Ok(false);
                };
                if other.ty != self.ty {
                    return Ok(false);
                }
                let (mine, theirs) = (self.snapshot(), other.snapshot());
                Ok(mine.len() == theirs.len()
                    && mine
                        .iter()
                        .zip(theirs.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same(vb)))
            }
        }
    }

    fn hash_code(&self) -> Result<i32, Fault> {
        if let Some(fault) = &self.hash_code_fault {
            return Err(fault.clone());
        }
        Ok(match self.equals_mode {
            EqualsMode::Fields => self.ty.name().len() as i32,
            _ => self.address() as i32,
        })
    }

    fn to_display_string(&self) -> Result<String, Fault> {
        if let Some(fault) = &self.to_string_fault {
            return Err(fault.clone());
        }
        Ok(format!("{}@{:x}", self.ty.name(), self.address() as u32))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared buffer handlers can print into.
#[derive(Debug, Clone, Default)]
pub struct OutputSink(Arc<Mutex<String>>);

impl OutputSink {
    pub fn print(&self, text: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    handlers: HashMap<String, Handler>,
    statics: BTreeMap<String, Value>,
    enum_constants: BTreeMap<String, Value>,
    output: OutputSink,
    timeout: Option<Duration>,
    calls: u64,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the operation with this descriptor.
    pub fn on<F>(&mut self, descriptor: &str, handler: F) -> &mut Self
    where
        F: FnMut(&[Value]) -> Result<Value, Fault> + Send + 'static,
    {
        self.handlers
            .insert(descriptor.to_string(), Box::new(handler));
        self
    }

    pub fn output_sink(&self) -> OutputSink {
        self.output.clone()
    }

    /// Number of invocations that reached the backend.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn default_invoke(&mut self, op: &Operation, args: &[Value]) -> Result<Value, Fault> {
        match op {
            Operation::ConstructorCall { declaring, .. } => {
                let obj = args
                    .iter()
                    .enumerate()
                    .fold(ScriptedObject::new(declaring), |obj, (i, arg)| {
                        obj.with_field(&format!("arg{i}"), arg.clone())
                    });
                Ok(Value::object(obj))
            }
            Operation::FieldGet {
                name,
                field_type,
                is_static,
                ..
            } => {
                let current = if *is_static {
                    self.statics.get(&static_key(op, name)).cloned()
                } else {
                    receiver(args)?.field(name)
                };
                Ok(current.unwrap_or_else(|| LiteralValue::null_or_zero(field_type).to_value()))
            }
            Operation::FieldSet {
                name, is_static, ..
            } => {
                if *is_static {
                    let value = args.first().cloned().unwrap_or(Value::Null);
                    self.statics.insert(static_key(op, name), value);
                } else {
                    let value = args.get(1).cloned().unwrap_or(Value::Null);
                    receiver(args)?.set_field(name, value);
                }
                Ok(Value::Void)
            }
            Operation::EnumConstant { declaring, name } => {
                let key = format!("{}.{}", declaring.name(), name);
                let value = self
                    .enum_constants
                    .entry(key)
                    .or_insert_with(|| {
                        Value::object(ScriptedObject::new(declaring).with_field("name", Value::str(name)))
                    })
                    .clone();
                Ok(value)
            }
            _ => Err(Fault::new(
                "java.lang.NoSuchMethodError",
                Some(&op.descriptor()),
            )),
        }
    }
}

fn static_key(op: &Operation, name: &str) -> String {
    match op.declaring_type() {
        Some(ty) => format!("{}.{}", ty.name(), name),
        None => name.to_string(),
    }
}

fn receiver(args: &[Value]) -> Result<&ScriptedObject, Fault> {
    args.first()
        .and_then(|v| v.downcast::<ScriptedObject>())
        .ok_or_else(|| Fault::new("java.lang.ClassCastException", Some("not a scripted object")))
}

impl ExecutionBackend for ScriptedBackend {
    fn invoke(&mut self, op: &Operation, args: &[Value]) -> Result<Value, Fault> {
        self.calls += 1;
        let start = Instant::now();
        let result = match self.handlers.get_mut(&op.descriptor()) {
            Some(handler) => handler(args),
            None => self.default_invoke(op, args),
        };
        match self.timeout {
            Some(limit) if start.elapsed() > limit => {
                Err(Fault::timeout(limit.as_millis() as u64))
            }
            _ => result,
        }
    }

    fn take_output(&mut self) -> String {
        self.output.take()
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::{PrimitiveKind, TypeRegistry};

    #[test]
    fn test_default_constructor_and_fields() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let int = reg.primitive(PrimitiveKind::Int);
        let mut backend = ScriptedBackend::new();

        let obj = backend
            .invoke(&Operation::constructor(&foo, vec![int.clone()]), &[Value::Int(4)])
            .unwrap();
        assert_eq!(obj.downcast::<ScriptedObject>().unwrap().field("arg0").unwrap().as_int(), Some(4));

        let get = Operation::getter(&foo, "count", &int, false);
        let set = Operation::setter(&foo, "count", &int, false);
        assert_eq!(backend.invoke(&get, &[obj.clone()]).unwrap().as_int(), Some(0));
        backend.invoke(&set, &[obj.clone(), Value::Int(9)]).unwrap();
        assert_eq!(backend.invoke(&get, &[obj]).unwrap().as_int(), Some(9));
    }

    #[test]
    fn test_enum_constants_are_interned() {
        let mut reg = TypeRegistry::new();
        let color = reg
            .declare(&ClassDecl::class("pkg.Color").with_kind(tessel_ir::types::ClassKind::Enum))
            .unwrap();
        let mut backend = ScriptedBackend::new();
        let op = Operation::enum_constant(&color, "RED");
        let a = backend.invoke(&op, &[]).unwrap();
        let b = backend.invoke(&op, &[]).unwrap();
        assert!(a.same(&b));
    }

    #[test]
    fn test_handler_and_output() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let op = Operation::method(&foo, "shout", vec![], &reg.void());
        let mut backend = ScriptedBackend::new();
        let sink = backend.output_sink();
        backend.on(&op.descriptor(), move |_| {
            sink.print("hey\n");
            Ok(Value::Void)
        });
        let obj = Value::object(ScriptedObject::new(&foo));
        backend.invoke(&op, &[obj]).unwrap();
        assert_eq!(backend.take_output(), "hey\n");
        assert_eq!(backend.take_output(), "");
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_equals_modes() {
        let reg = TypeRegistry::new();
        let ty = reg.object();
        let a = Value::object(ScriptedObject::new(&ty).with_equals(EqualsMode::Fields));
        let b = Value::object(ScriptedObject::new(&ty).with_equals(EqualsMode::Fields));
        let never = Value::object(ScriptedObject::new(&ty).with_equals(EqualsMode::Never));
        let ident = Value::object(ScriptedObject::new(&ty));
        assert!(a.as_object().unwrap().equals(&b).unwrap());
        assert!(!never.as_object().unwrap().equals(&never).unwrap());
        assert!(ident.as_object().unwrap().equals(&ident).unwrap());
        assert!(!ident.as_object().unwrap().equals(&a).unwrap());
    }
}
