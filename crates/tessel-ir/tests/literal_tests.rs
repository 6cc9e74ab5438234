use proptest::prelude::*;
use tessel_ir::literal::{escape, parse_typed_literal, unescape};
use tessel_ir::types::{PrimitiveKind, TypeRegistry};
use tessel_ir::{LiteralValue, Operation};

proptest! {
    #[test]
    fn escaped_strings_never_contain_separator(s in ".{0,64}") {
        let escaped = escape(&s);
        prop_assert!(!escaped.contains(':'));
        prop_assert_eq!(unescape(&escaped).unwrap(), s);
    }

    #[test]
    fn string_literal_descriptor_reparses(s in ".{0,64}") {
        let reg = TypeRegistry::new();
        let op = Operation::literal(&reg.string(), LiteralValue::Str(s.clone())).unwrap();
        let (_, value) = parse_typed_literal(&op.descriptor(), &reg).unwrap();
        prop_assert_eq!(value, LiteralValue::Str(s));
    }

    #[test]
    fn double_literal_descriptor_reparses(
        v in prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO | prop::num::f64::INFINITE
    ) {
        let reg = TypeRegistry::new();
        let ty = reg.primitive(PrimitiveKind::Double);
        let op = Operation::literal(&ty, LiteralValue::Double(v)).unwrap();
        let (_, value) = parse_typed_literal(&op.descriptor(), &reg).unwrap();
        prop_assert_eq!(value, LiteralValue::Double(v));
    }
}

#[test]
fn test_null_or_zero_is_idempotent() {
    let reg = TypeRegistry::new();
    for kind in PrimitiveKind::ALL {
        let ty = reg.primitive(kind);
        assert_eq!(Operation::null_or_zero(&ty), Operation::null_or_zero(&ty));
    }
    assert_eq!(
        Operation::null_or_zero(&reg.object()),
        Operation::null_or_zero(&reg.object())
    );
}

#[test]
fn test_too_long_string_rejected() {
    let reg = TypeRegistry::new();
    let long = format!("java.lang.String:\"{}\"", "x".repeat(10_001));
    assert!(parse_typed_literal(&long, &reg).is_err());
}
