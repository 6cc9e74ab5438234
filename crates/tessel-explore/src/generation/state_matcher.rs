//! Object cache deciding whether a produced object's observable state is new.

use std::collections::BTreeMap;

use tessel_ir::{Type, Value};

pub trait StateMatcher: Send {
    /// Record `value`. Returns true if no equivalent value was seen before.
    fn add(&mut self, value: &Value) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Treats two objects of the same runtime type as equivalent when
/// `equals` says so. An `equals` that throws never matches.
#[derive(Debug, Default)]
pub struct EqualsMatcher {
    seen: BTreeMap<Type, Vec<Value>>,
    count: usize,
}

impl EqualsMatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateMatcher for EqualsMatcher {
    fn add(&mut self, value: &Value) -> bool {
        let Some(obj) = value.as_object() else {
            return true;
        };
        let bucket = self.seen.entry(obj.runtime_type()).or_default();
        if bucket.iter().any(|prev| obj.equals(prev).unwrap_or(false)) {
            return false;
        }
        bucket.push(value.clone());
        self.count += 1;
        true
    }

    fn len(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::TypeRegistry;
    use tessel_sandbox::{EqualsMode, ScriptedObject};

    #[test]
    fn test_field_equal_objects_match() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let make = |v| {
            Value::object(
                ScriptedObject::new(&foo)
                    .with_equals(EqualsMode::Fields)
                    .with_field("x", Value::Int(v)),
            )
        };
        let mut m = EqualsMatcher::new();
        assert!(m.add(&make(1)));
        assert!(!m.add(&make(1)));
        assert!(m.add(&make(2)));
        assert_eq!(m.len(), 2);
        assert!(m.add(&Value::Int(1)));
    }

    #[test]
    fn test_never_equal_objects_always_new() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let mut m = EqualsMatcher::new();
        for _ in 0..3 {
            assert!(m.add(&Value::object(ScriptedObject::new(&foo).with_equals(EqualsMode::Never))));
        }
    }
}
