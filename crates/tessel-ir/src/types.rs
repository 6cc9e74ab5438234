//! Type model for the code under test.
//!
//! A `Type` is a cheap, clonable handle identified by its canonical name
//! (`int`, `java.lang.String`, `pkg.Foo[]`). Equality, ordering and hashing
//! all go through the name, so two handles built independently for the same
//! name are interchangeable.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const VOID: &str = "void";

#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("Unknown type: {0}")]
    Unknown(String),

    #[error("Type already declared: {0}")]
    Duplicate(String),

    #[error("Invalid type name: {0}")]
    InvalidName(String),

    #[error("Type '{name}' cannot extend '{parent}'")]
    InvalidSupertype { name: String, parent: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

// ── Primitives ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Name of the reference type this primitive boxes to.
    pub fn boxed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "java.lang.Boolean",
            PrimitiveKind::Char => "java.lang.Character",
            PrimitiveKind::Byte => "java.lang.Byte",
            PrimitiveKind::Short => "java.lang.Short",
            PrimitiveKind::Int => "java.lang.Integer",
            PrimitiveKind::Long => "java.lang.Long",
            PrimitiveKind::Float => "java.lang.Float",
            PrimitiveKind::Double => "java.lang.Double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Char)
    }
}

// ── Type handles ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
}

/// Declared shape of a reference type.
#[derive(Debug)]
pub struct ClassInfo {
    pub superclass: Option<Type>,
    pub interfaces: Vec<Type>,
    pub kind: ClassKind,
    /// Set for the wrapper classes of primitives (`java.lang.Integer` -> int).
    pub unboxed: Option<PrimitiveKind>,
}

#[derive(Debug)]
pub enum TypeKind {
    Void,
    Primitive { kind: PrimitiveKind, boxed: Type },
    Class(ClassInfo),
    Array(Type),
}

struct TypeData {
    name: String,
    kind: TypeKind,
}

#[derive(Clone)]
pub struct Type(Arc<TypeData>);

impl Type {
    fn from_parts(name: String, kind: TypeKind) -> Self {
        Type(Arc::new(TypeData { name, kind }))
    }

    pub fn void() -> Self {
        Self::from_parts(VOID.to_string(), TypeKind::Void)
    }

    pub fn array_of(element: &Type) -> Self {
        Self::from_parts(
            format!("{}[]", element.name()),
            TypeKind::Array(element.clone()),
        )
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind(), TypeKind::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind(), TypeKind::Primitive { .. })
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self.kind() {
            TypeKind::Primitive { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The primitive a wrapper class boxes, if this is one.
    pub fn unboxed(&self) -> Option<PrimitiveKind> {
        self.class_info().and_then(|info| info.unboxed)
    }

    pub fn is_boxed_primitive(&self) -> bool {
        self.unboxed().is_some()
    }

    pub fn is_string(&self) -> bool {
        self.name() == STRING
    }

    pub fn is_object(&self) -> bool {
        self.name() == OBJECT
    }

    /// Primitive, boxed primitive or `String`: the types whose values are
    /// rendered as literals rather than reused as objects.
    pub fn is_primitive_like(&self) -> bool {
        self.is_primitive() || self.is_boxed_primitive() || self.is_string()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TypeKind::Array(_))
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn class_info(&self) -> Option<&ClassInfo> {
        match self.kind() {
            TypeKind::Class(info) => Some(info),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind(), TypeKind::Class(_) | TypeKind::Array(_))
    }

    pub fn is_enum(&self) -> bool {
        self.class_info().is_some_and(|i| i.kind == ClassKind::Enum)
    }

    pub fn is_interface(&self) -> bool {
        self.class_info().is_some_and(|i| i.kind == ClassKind::Interface)
    }

    pub fn superclass(&self) -> Option<&Type> {
        self.class_info().and_then(|i| i.superclass.as_ref())
    }

    /// Package of a class type (`pkg.sub` for `pkg.sub.Foo`).
    pub fn package(&self) -> Option<&str> {
        self.class_info()?;
        self.name().rsplit_once('.').map(|(pkg, _)| pkg)
    }

    pub fn simple_name(&self) -> &str {
        self.name().rsplit_once('.').map_or(self.name(), |(_, simple)| simple)
    }

    /// Reference subtyping over the declared class graph. Every class,
    /// interface and array type is a subtype of `java.lang.Object`.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        if !self.is_reference() || !other.is_reference() {
            return false;
        }
        if other.is_object() {
            return true;
        }
        let mut stack = vec![self.clone()];
        while let Some(current) = stack.pop() {
            if &current == other {
                return true;
            }
            if let Some(info) = current.class_info() {
                stack.extend(info.superclass.iter().cloned());
                stack.extend(info.interfaces.iter().cloned());
            }
        }
        false
    }

    /// Whether a value of `self` can be passed where `target` is declared.
    ///
    /// Arrays are usable as `Object` or as arrays with compatible element
    /// types (primitive elements must match exactly). Primitives on either
    /// side are boxed before the reference check, so `int` is usable as
    /// `Number` and `Integer` as `int`, but `int` is not usable as `long`.
    pub fn can_be_used_as(&self, target: &Type) -> bool {
        if self == target {
            return true;
        }
        if self.is_void() || target.is_void() {
            return false;
        }
        match (self.kind(), target.kind()) {
            (TypeKind::Array(_), _) if target.is_object() => true,
            (TypeKind::Array(from), TypeKind::Array(to)) => {
                if from.is_primitive() || to.is_primitive() {
                    from == to
                } else {
                    from.can_be_used_as(to)
                }
            }
            (TypeKind::Array(_), _) => false,
            _ => self.boxed_or_self().is_subtype_of(target.boxed_or_self()),
        }
    }

    fn boxed_or_self(&self) -> &Type {
        match self.kind() {
            TypeKind::Primitive { boxed, .. } => boxed,
            _ => self,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl PartialOrd for Type {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Type {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How strictly a candidate type must match a requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    ExactType,
    CompatibleType,
}

impl Match {
    pub fn matches(self, candidate: &Type, target: &Type) -> bool {
        match self {
            Match::ExactType => candidate == target,
            Match::CompatibleType => candidate.can_be_used_as(target),
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// A class declaration as it appears in a universe file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub kind: ClassKind,
}

impl ClassDecl {
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: None,
            interfaces: Vec::new(),
            kind: ClassKind::Class,
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Interns declared types by canonical name.
///
/// Comes preloaded with `java.lang.Object`, `java.lang.String`, the wrapper
/// classes and the primitives, so literal handling never needs a user
/// declaration.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: BTreeMap<String, Type>,
    primitives: Vec<Type>,
    object: Type,
    string: Type,
    void: Type,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let object = Type::from_parts(
            OBJECT.to_string(),
            TypeKind::Class(ClassInfo {
                superclass: None,
                interfaces: Vec::new(),
                kind: ClassKind::Class,
                unboxed: None,
            }),
        );
        let mut types = BTreeMap::new();
        types.insert(OBJECT.to_string(), object.clone());

        let interface = |name: &str| {
            Type::from_parts(
                name.to_string(),
                TypeKind::Class(ClassInfo {
                    superclass: None,
                    interfaces: Vec::new(),
                    kind: ClassKind::Interface,
                    unboxed: None,
                }),
            )
        };
        let serializable = interface("java.io.Serializable");
        let comparable = interface("java.lang.Comparable");
        let char_sequence = interface("java.lang.CharSequence");
        let cloneable = interface("java.lang.Cloneable");
        for t in [&serializable, &comparable, &char_sequence, &cloneable] {
            types.insert(t.name().to_string(), t.clone());
        }

        let class = |name: &str, superclass: &Type, interfaces: Vec<Type>, unboxed| {
            Type::from_parts(
                name.to_string(),
                TypeKind::Class(ClassInfo {
                    superclass: Some(superclass.clone()),
                    interfaces,
                    kind: ClassKind::Class,
                    unboxed,
                }),
            )
        };
        let number = class("java.lang.Number", &object, vec![serializable.clone()], None);
        let string = class(
            STRING,
            &object,
            vec![serializable.clone(), comparable.clone(), char_sequence],
            None,
        );
        types.insert(number.name().to_string(), number.clone());
        types.insert(STRING.to_string(), string.clone());

        let mut primitives = Vec::with_capacity(PrimitiveKind::ALL.len());
        for kind in PrimitiveKind::ALL {
            let parent = if kind.is_numeric() { &number } else { &object };
            let boxed = class(
                kind.boxed_name(),
                parent,
                vec![serializable.clone(), comparable.clone()],
                Some(kind),
            );
            types.insert(boxed.name().to_string(), boxed.clone());
            let prim = Type::from_parts(
                kind.name().to_string(),
                TypeKind::Primitive { kind, boxed },
            );
            types.insert(kind.name().to_string(), prim.clone());
            primitives.push(prim);
        }

        let void = Type::void();
        types.insert(VOID.to_string(), void.clone());

        Self {
            types,
            primitives,
            object,
            string,
            void,
        }
    }

    /// Load a registry from a JSON array of class declarations, in order.
    pub fn from_json(json: &str) -> Result<Self, TypeError> {
        let decls: Vec<ClassDecl> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for decl in &decls {
            registry.declare(decl)?;
        }
        Ok(registry)
    }

    /// Register a class, interface or enum. Supertypes must already be known.
    pub fn declare(&mut self, decl: &ClassDecl) -> Result<Type, TypeError> {
        let name = decl.name.trim();
        if name.is_empty()
            || name.ends_with("[]")
            || name.contains(char::is_whitespace)
            || PrimitiveKind::from_name(name).is_some()
        {
            return Err(TypeError::InvalidName(decl.name.clone()));
        }
        if self.types.contains_key(name) {
            return Err(TypeError::Duplicate(name.to_string()));
        }

        let superclass = match (&decl.superclass, decl.kind) {
            (_, ClassKind::Interface) => None,
            (Some(parent), _) => {
                let parent_type = self.resolve(parent)?;
                if parent_type.class_info().is_none() || parent_type.is_interface() {
                    return Err(TypeError::InvalidSupertype {
                        name: name.to_string(),
                        parent: parent.clone(),
                    });
                }
                Some(parent_type)
            }
            (None, _) => Some(self.object.clone()),
        };
        let mut interfaces = Vec::with_capacity(decl.interfaces.len());
        for iface in &decl.interfaces {
            let t = self.resolve(iface)?;
            if !t.is_interface() {
                return Err(TypeError::InvalidSupertype {
                    name: name.to_string(),
                    parent: iface.clone(),
                });
            }
            interfaces.push(t);
        }

        let t = Type::from_parts(
            name.to_string(),
            TypeKind::Class(ClassInfo {
                superclass,
                interfaces,
                kind: decl.kind,
                unboxed: None,
            }),
        );
        self.types.insert(name.to_string(), t.clone());
        Ok(t)
    }

    /// Look up a type by canonical name; `T[]` names are built on demand.
    pub fn resolve(&self, name: &str) -> Result<Type, TypeError> {
        let name = name.trim();
        if let Some(t) = self.types.get(name) {
            return Ok(t.clone());
        }
        match name.strip_suffix("[]") {
            Some(element) => Ok(Type::array_of(&self.resolve(element)?)),
            None => Err(TypeError::Unknown(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn primitive(&self, kind: PrimitiveKind) -> Type {
        self.primitives[kind as usize].clone()
    }

    pub fn object(&self) -> Type {
        self.object.clone()
    }

    pub fn string(&self) -> Type {
        self.string.clone()
    }

    pub fn void(&self) -> Type {
        self.void.clone()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.types.values()
    }
}
