//! The default seed pool: a handful of literals per primitive type plus two
//! strings.

use std::sync::Arc;

use tessel_ir::{LiteralValue, Operation, PrimitiveKind, Type, TypeRegistry};
use tessel_sequence::Sequence;

pub fn default_seeds(registry: &TypeRegistry) -> Vec<Sequence> {
    let mut literals: Vec<(Type, LiteralValue)> = Vec::new();
    let prim = |k| registry.primitive(k);

    for v in [-1i8, 0, 1, 10, 100] {
        literals.push((prim(PrimitiveKind::Byte), LiteralValue::Byte(v)));
    }
    for v in [-1i16, 0, 1, 10, 100] {
        literals.push((prim(PrimitiveKind::Short), LiteralValue::Short(v)));
    }
    for v in [-1i32, 0, 1, 10, 100] {
        literals.push((prim(PrimitiveKind::Int), LiteralValue::Int(v)));
    }
    for v in [-1i64, 0, 1, 10, 100] {
        literals.push((prim(PrimitiveKind::Long), LiteralValue::Long(v)));
    }
    for v in ['#', ' ', '4', 'a'] {
        literals.push((prim(PrimitiveKind::Char), LiteralValue::Char(v)));
    }
    for v in [-1.0f32, 0.0, 1.0, 10.0, 100.0] {
        literals.push((prim(PrimitiveKind::Float), LiteralValue::Float(v)));
    }
    for v in [-1.0f64, 0.0, 1.0, 10.0, 100.0] {
        literals.push((prim(PrimitiveKind::Double), LiteralValue::Double(v)));
    }
    for v in [true, false] {
        literals.push((prim(PrimitiveKind::Boolean), LiteralValue::Bool(v)));
    }
    for v in ["", "hi!"] {
        literals.push((registry.string(), LiteralValue::Str(v.to_string())));
    }

    literals
        .into_iter()
        .filter_map(|(ty, value)| Operation::literal(&ty, value).ok())
        .filter_map(|op| Sequence::create(Arc::new(op)).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed_pool() {
        let reg = TypeRegistry::new();
        let seeds = default_seeds(&reg);
        assert_eq!(seeds.len(), 5 * 4 + 4 + 5 * 2 + 2 + 2);
        assert!(seeds.iter().all(Sequence::is_primitive));
        let strings = seeds
            .iter()
            .filter(|s| s.output_type(0).is_some_and(|t| t.is_string()))
            .count();
        assert_eq!(strings, 2);
    }
}
