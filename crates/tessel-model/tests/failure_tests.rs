use std::sync::Arc;

use tessel_ir::types::ClassDecl;
use tessel_ir::{LiteralValue, Operation, PrimitiveKind, TypeRegistry};
use tessel_model::{Check, CheckDecorator, FailureAnalyzer, TestChecks};
use tessel_sequence::Sequence;

fn sequence() -> Sequence {
    let mut reg = TypeRegistry::new();
    let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
    let int = reg.primitive(PrimitiveKind::Int);
    Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(7)).unwrap()))
        .unwrap()
        .extend_indices(Arc::new(Operation::constructor(&foo, vec![int])), &[0])
        .unwrap()
}

fn reflexive_violation(var: usize) -> Check {
    Check::ContractViolation {
        contract: "EqualsReflexive".to_string(),
        description: "equals-reflexive on o".to_string(),
        vars: vec![var],
        code: format!("var{var}.equals(var{var})"),
    }
}

#[test]
fn test_failures_keyed_by_operation_and_kind() {
    let seq = sequence();
    let mut checks = vec![TestChecks::new(), TestChecks::new()];
    checks[1].add(reflexive_violation(1));
    checks[1].add(Check::IsNotNull { var: 1 });

    let failures = FailureAnalyzer::failures(&seq, &checks);
    assert_eq!(failures.len(), 1);
    let failure = failures.iter().next().unwrap();
    assert_eq!(failure.operation, "pkg.Foo.<init>(int)");
    assert_eq!(failure.violation, "EqualsReflexive");
}

#[test]
fn test_no_failures_for_regression_checks() {
    let seq = sequence();
    let mut checks = vec![TestChecks::new(), TestChecks::new()];
    checks[1].add(Check::IsNotNull { var: 1 });
    assert!(FailureAnalyzer::failures(&seq, &checks).is_empty());
}

#[test]
fn test_decorated_code() {
    let seq = sequence();
    let mut checks = vec![TestChecks::new(), TestChecks::new()];
    checks[1].add(reflexive_violation(1));
    let code = seq.to_code_with(&CheckDecorator::new(&checks));
    assert_eq!(
        code,
        "int var0 = 7;\n\
         pkg.Foo var1 = new pkg.Foo(var0);\n\
         assertTrue(\"Contract failed: equals-reflexive on o\", var1.equals(var1));\n"
    );
}

#[test]
fn test_checks_serialize() {
    let mut tc = TestChecks::new();
    tc.add(reflexive_violation(1));
    let json = serde_json::to_string(&tc).unwrap();
    let back: TestChecks = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tc);
}
