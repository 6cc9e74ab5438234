//! The closed set of invocable units a statement can apply.
//!
//! Every operation has a stable descriptor string (its canonical parseable
//! form) plus a short kind id; the pair round-trips through
//! [`crate::parse::parse_operation`].

use std::fmt;
use std::time::Instant;

use crate::backend::ExecutionBackend;
use crate::literal::LiteralValue;
use crate::outcome::ExecutionOutcome;
use crate::types::Type;
use crate::value::{ArrayValue, Fault, Value};

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("Operation {descriptor} expects {expected} arguments, got {actual}")]
    Arity {
        descriptor: String,
        expected: usize,
        actual: usize,
    },

    #[error("Literal {value} cannot be declared with type {ty}")]
    LiteralTypeMismatch { ty: String, value: String },

    #[error("Array element type cannot be void")]
    VoidArrayElement,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    MethodCall {
        declaring: Type,
        name: String,
        params: Vec<Type>,
        returns: Type,
        is_static: bool,
    },
    ConstructorCall {
        declaring: Type,
        params: Vec<Type>,
    },
    FieldGet {
        declaring: Type,
        name: String,
        field_type: Type,
        is_static: bool,
    },
    FieldSet {
        declaring: Type,
        name: String,
        field_type: Type,
        is_static: bool,
    },
    /// A primitive, string or null declaration.
    Literal { ty: Type, value: LiteralValue },
    ArrayCreate { element: Type, length: usize },
    EnumConstant { declaring: Type, name: String },
}

impl Operation {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn method(declaring: &Type, name: &str, params: Vec<Type>, returns: &Type) -> Self {
        Operation::MethodCall {
            declaring: declaring.clone(),
            name: name.to_string(),
            params,
            returns: returns.clone(),
            is_static: false,
        }
    }

    pub fn static_method(declaring: &Type, name: &str, params: Vec<Type>, returns: &Type) -> Self {
        Operation::MethodCall {
            declaring: declaring.clone(),
            name: name.to_string(),
            params,
            returns: returns.clone(),
            is_static: true,
        }
    }

    pub fn constructor(declaring: &Type, params: Vec<Type>) -> Self {
        Operation::ConstructorCall {
            declaring: declaring.clone(),
            params,
        }
    }

    pub fn getter(declaring: &Type, name: &str, field_type: &Type, is_static: bool) -> Self {
        Operation::FieldGet {
            declaring: declaring.clone(),
            name: name.to_string(),
            field_type: field_type.clone(),
            is_static,
        }
    }

    pub fn setter(declaring: &Type, name: &str, field_type: &Type, is_static: bool) -> Self {
        Operation::FieldSet {
            declaring: declaring.clone(),
            name: name.to_string(),
            field_type: field_type.clone(),
            is_static,
        }
    }

    pub fn literal(ty: &Type, value: LiteralValue) -> Result<Self, OperationError> {
        if !value.matches_type(ty) {
            return Err(OperationError::LiteralTypeMismatch {
                ty: ty.name().to_string(),
                value: value.render(),
            });
        }
        Ok(Operation::Literal {
            ty: ty.clone(),
            value,
        })
    }

    /// `null` for reference types, the zero value for primitives, `""` for
    /// strings. Always yields an equal operation for the same type.
    pub fn null_or_zero(ty: &Type) -> Self {
        Operation::Literal {
            ty: ty.clone(),
            value: LiteralValue::null_or_zero(ty),
        }
    }

    pub fn array(element: &Type, length: usize) -> Result<Self, OperationError> {
        if element.is_void() {
            return Err(OperationError::VoidArrayElement);
        }
        Ok(Operation::ArrayCreate {
            element: element.clone(),
            length,
        })
    }

    pub fn enum_constant(declaring: &Type, name: &str) -> Self {
        Operation::EnumConstant {
            declaring: declaring.clone(),
            name: name.to_string(),
        }
    }

    // ── Signature ────────────────────────────────────────────────────

    /// Declared input types in slot order. Instance members take their
    /// receiver in slot 0.
    pub fn input_types(&self) -> Vec<Type> {
        match self {
            Operation::MethodCall {
                declaring,
                params,
                is_static,
                ..
            } => {
                let mut types = Vec::with_capacity(params.len() + 1);
                if !is_static {
                    types.push(declaring.clone());
                }
                types.extend(params.iter().cloned());
                types
            }
            Operation::ConstructorCall { params, .. } => params.clone(),
            Operation::FieldGet {
                declaring,
                is_static,
                ..
            } => {
                if *is_static {
                    Vec::new()
                } else {
                    vec![declaring.clone()]
                }
            }
            Operation::FieldSet {
                declaring,
                field_type,
                is_static,
                ..
            } => {
                if *is_static {
                    vec![field_type.clone()]
                } else {
                    vec![declaring.clone(), field_type.clone()]
                }
            }
            Operation::Literal { .. } | Operation::EnumConstant { .. } => Vec::new(),
            Operation::ArrayCreate { element, length } => vec![element.clone(); *length],
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Operation::MethodCall {
                params, is_static, ..
            } => params.len() + usize::from(!is_static),
            Operation::ConstructorCall { params, .. } => params.len(),
            Operation::FieldGet { is_static, .. } => usize::from(!is_static),
            Operation::FieldSet { is_static, .. } => 1 + usize::from(!is_static),
            Operation::Literal { .. } | Operation::EnumConstant { .. } => 0,
            Operation::ArrayCreate { length, .. } => *length,
        }
    }

    pub fn output_type(&self) -> Type {
        match self {
            Operation::MethodCall { returns, .. } => returns.clone(),
            Operation::ConstructorCall { declaring, .. }
            | Operation::EnumConstant { declaring, .. } => declaring.clone(),
            Operation::FieldGet { field_type, .. } => field_type.clone(),
            Operation::FieldSet { .. } => Type::void(),
            Operation::Literal { ty, .. } => ty.clone(),
            Operation::ArrayCreate { element, .. } => Type::array_of(element),
        }
    }

    pub fn declaring_type(&self) -> Option<&Type> {
        match self {
            Operation::MethodCall { declaring, .. }
            | Operation::ConstructorCall { declaring, .. }
            | Operation::FieldGet { declaring, .. }
            | Operation::FieldSet { declaring, .. }
            | Operation::EnumConstant { declaring, .. } => Some(declaring),
            Operation::Literal { .. } | Operation::ArrayCreate { .. } => None,
        }
    }

    /// Whether slot 0 is a receiver that must not be null.
    pub fn has_receiver(&self) -> bool {
        match self {
            Operation::MethodCall { is_static, .. }
            | Operation::FieldGet { is_static, .. }
            | Operation::FieldSet { is_static, .. } => !is_static,
            _ => false,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operation::Literal { .. })
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Operation::Literal { value, .. } if value.is_null())
    }

    pub fn literal_value(&self) -> Option<&LiteralValue> {
        match self {
            Operation::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, Operation::ConstructorCall { .. })
    }

    /// An instance method with the given name taking no parameters besides
    /// the receiver, e.g. `toString()`.
    pub fn is_nullary_method(&self, method: &str) -> bool {
        matches!(
            self,
            Operation::MethodCall { name, params, is_static: false, .. }
                if name == method && params.is_empty()
        )
    }

    // ── Descriptors ──────────────────────────────────────────────────

    pub fn kind_id(&self) -> &'static str {
        match self {
            Operation::MethodCall { .. } => "method",
            Operation::ConstructorCall { .. } => "cons",
            Operation::FieldGet { .. } => "getter",
            Operation::FieldSet { .. } => "setter",
            Operation::Literal { .. } => "prim",
            Operation::ArrayCreate { .. } => "array",
            Operation::EnumConstant { .. } => "enum",
        }
    }

    /// Canonical parseable form, e.g. `pkg.Foo.<init>(int)`,
    /// `static pkg.Foo.parse(java.lang.String)->pkg.Foo`, `int:3`.
    pub fn descriptor(&self) -> String {
        let static_prefix = |is_static: bool| if is_static { "static " } else { "" };
        match self {
            Operation::MethodCall {
                declaring,
                name,
                params,
                returns,
                is_static,
            } => format!(
                "{}{}.{}({})->{}",
                static_prefix(*is_static),
                declaring,
                name,
                join_types(params),
                returns
            ),
            Operation::ConstructorCall { declaring, params } => {
                format!("{}.<init>({})", declaring, join_types(params))
            }
            Operation::FieldGet {
                declaring,
                name,
                field_type,
                is_static,
            }
            | Operation::FieldSet {
                declaring,
                name,
                field_type,
                is_static,
            } => format!(
                "{}{}.{}:{}",
                static_prefix(*is_static),
                declaring,
                name,
                field_type
            ),
            Operation::Literal { ty, value } => format!("{}:{}", ty, value.render()),
            Operation::ArrayCreate { element, length } => format!("{element}[]:{length}"),
            Operation::EnumConstant { declaring, name } => format!("{declaring}.{name}"),
        }
    }

    // ── Code rendering ───────────────────────────────────────────────

    /// Append the source line for this operation, assigning its result to
    /// `var` and reading its inputs from `inputs`.
    pub fn append_code(&self, var: &str, inputs: &[String], out: &mut String) {
        let args = |from: usize| inputs.get(from..).unwrap_or_default().join(", ");
        let target = |declaring: &Type, is_static: bool| {
            if is_static {
                declaring.name().to_string()
            } else {
                inputs.first().cloned().unwrap_or_default()
            }
        };
        match self {
            Operation::MethodCall {
                declaring,
                name,
                returns,
                is_static,
                ..
            } => {
                let call = format!(
                    "{}.{}({})",
                    target(declaring, *is_static),
                    name,
                    args(usize::from(!is_static))
                );
                if returns.is_void() {
                    out.push_str(&format!("{call};"));
                } else {
                    out.push_str(&format!("{returns} {var} = {call};"));
                }
            }
            Operation::ConstructorCall { declaring, .. } => {
                out.push_str(&format!("{declaring} {var} = new {declaring}({});", args(0)));
            }
            Operation::FieldGet {
                declaring,
                name,
                field_type,
                is_static,
            } => {
                out.push_str(&format!(
                    "{field_type} {var} = {}.{name};",
                    target(declaring, *is_static)
                ));
            }
            Operation::FieldSet {
                declaring,
                name,
                is_static,
                ..
            } => {
                let value = inputs.last().cloned().unwrap_or_default();
                out.push_str(&format!("{}.{name} = {value};", target(declaring, *is_static)));
            }
            Operation::Literal { ty, value } => {
                out.push_str(&format!("{ty} {var} = {};", value.java_code()));
            }
            Operation::ArrayCreate { element, .. } => {
                out.push_str(&format!(
                    "{element}[] {var} = new {element}[] {{ {} }};",
                    args(0)
                ));
            }
            Operation::EnumConstant { declaring, name } => {
                out.push_str(&format!("{declaring} {var} = {declaring}.{name};"));
            }
        }
    }

    // ── Execution ────────────────────────────────────────────────────

    /// Run the operation on concrete arguments.
    ///
    /// Faults raised by the code under test come back as
    /// `ExecutionOutcome::Exceptional`; only an arity mismatch, which means
    /// the engine built a malformed statement, is an `Err`.
    pub fn execute(
        &self,
        args: &[Value],
        backend: &mut dyn ExecutionBackend,
    ) -> Result<ExecutionOutcome, OperationError> {
        if args.len() != self.arity() {
            return Err(OperationError::Arity {
                descriptor: self.descriptor(),
                expected: self.arity(),
                actual: args.len(),
            });
        }

        let start = Instant::now();
        let result = match self {
            Operation::Literal { value, .. } => Ok(value.to_value()),
            Operation::ArrayCreate { element, .. } => Ok(Value::Array(
                ArrayValue {
                    element: element.clone(),
                    items: args.to_vec(),
                }
                .into(),
            )),
            _ if self.has_receiver() && args[0].is_null() => Err(Fault::null_pointer()),
            _ => backend.invoke(self, args),
        };
        let elapsed = start.elapsed();

        Ok(match result {
            Ok(value) => ExecutionOutcome::Normal { value, elapsed },
            Err(fault) => ExecutionOutcome::Exceptional { fault, elapsed },
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

fn join_types(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::name)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassDecl, PrimitiveKind, TypeRegistry};

    struct NoBackend;

    impl ExecutionBackend for NoBackend {
        fn invoke(&mut self, op: &Operation, _args: &[Value]) -> Result<Value, Fault> {
            Err(Fault::new(
                "java.lang.UnsupportedOperationException",
                Some(&op.descriptor()),
            ))
        }
    }

    fn setup() -> (TypeRegistry, Type) {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        (reg, foo)
    }

    #[test]
    fn test_instance_method_signature() {
        let (reg, foo) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        let op = Operation::method(&foo, "add", vec![int.clone()], &reg.void());
        assert_eq!(op.input_types(), vec![foo.clone(), int]);
        assert_eq!(op.arity(), 2);
        assert!(op.output_type().is_void());
        assert!(op.has_receiver());
        assert_eq!(op.descriptor(), "pkg.Foo.add(int)->void");
        assert_eq!(op.kind_id(), "method");
    }

    #[test]
    fn test_static_and_field_descriptors() {
        let (reg, foo) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        let op = Operation::static_method(&foo, "of", vec![int.clone()], &foo);
        assert_eq!(op.descriptor(), "static pkg.Foo.of(int)->pkg.Foo");
        assert!(!op.has_receiver());

        let get = Operation::getter(&foo, "count", &int, false);
        assert_eq!(get.descriptor(), "pkg.Foo.count:int");
        assert_eq!(get.input_types(), vec![foo.clone()]);

        let set = Operation::setter(&foo, "count", &int, true);
        assert_eq!(set.descriptor(), "static pkg.Foo.count:int");
        assert_eq!(set.input_types(), vec![int]);
    }

    #[test]
    fn test_array_create_signature() {
        let (reg, _) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        let op = Operation::array(&int, 3).unwrap();
        assert_eq!(op.input_types().len(), 3);
        assert_eq!(op.output_type().name(), "int[]");
        assert_eq!(op.descriptor(), "int[]:3");
        assert!(Operation::array(&reg.void(), 1).is_err());
    }

    #[test]
    fn test_literal_type_checked() {
        let (reg, foo) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        assert!(Operation::literal(&int, LiteralValue::Int(1)).is_ok());
        assert!(Operation::literal(&int, LiteralValue::Null).is_err());
        assert!(Operation::literal(&foo, LiteralValue::Null).unwrap().is_null_literal());
        assert_eq!(Operation::null_or_zero(&foo), Operation::null_or_zero(&foo));
    }

    #[test]
    fn test_execute_rejects_bad_arity() {
        let (reg, foo) = setup();
        let op = Operation::method(&foo, "size", vec![], &reg.primitive(PrimitiveKind::Int));
        let err = op.execute(&[], &mut NoBackend).unwrap_err();
        assert!(matches!(err, OperationError::Arity { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn test_execute_null_receiver_throws_npe() {
        let (reg, foo) = setup();
        let op = Operation::method(&foo, "size", vec![], &reg.primitive(PrimitiveKind::Int));
        let outcome = op.execute(&[Value::Null], &mut NoBackend).unwrap();
        assert_eq!(
            outcome.fault().map(|f| f.class_name.as_str()),
            Some("java.lang.NullPointerException")
        );
    }

    #[test]
    fn test_execute_literal_and_array_locally() {
        let (reg, _) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        let lit = Operation::literal(&int, LiteralValue::Int(7)).unwrap();
        let outcome = lit.execute(&[], &mut NoBackend).unwrap();
        assert_eq!(outcome.value().and_then(Value::as_int), Some(7));

        let arr = Operation::array(&int, 2).unwrap();
        let outcome = arr
            .execute(&[Value::Int(1), Value::Int(2)], &mut NoBackend)
            .unwrap();
        match outcome.value() {
            Some(Value::Array(a)) => assert_eq!(a.items.len(), 2),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_append_code() {
        let (reg, foo) = setup();
        let int = reg.primitive(PrimitiveKind::Int);
        let mut out = String::new();
        Operation::constructor(&foo, vec![int.clone()]).append_code(
            "var1",
            &["var0".to_string()],
            &mut out,
        );
        assert_eq!(out, "pkg.Foo var1 = new pkg.Foo(var0);");

        out.clear();
        Operation::method(&foo, "get", vec![], &int).append_code(
            "var2",
            &["var1".to_string()],
            &mut out,
        );
        assert_eq!(out, "int var2 = var1.get();");

        out.clear();
        Operation::literal(&reg.string(), LiteralValue::Str("hi".into()))
            .unwrap()
            .append_code("var0", &[], &mut out);
        assert_eq!(out, "java.lang.String var0 = \"hi\";");
    }
}
