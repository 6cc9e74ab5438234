//! Object contracts: properties every well-behaved object is expected to
//! satisfy, probed on the live values a sequence produces.

use std::fmt;
use std::sync::Arc;

use tessel_ir::{Fault, RuntimeObject, Value};

/// Largest tuple a contract may range over.
pub const MAX_CONTRACT_ARITY: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("contract {name} has arity {arity}, at most {max} is supported", max = MAX_CONTRACT_ARITY)]
    Arity { name: &'static str, arity: usize },
}

/// Result of evaluating a contract on one tuple of values.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractOutcome {
    Holds,
    Violated,
    /// Evaluating the contract threw.
    Threw(Fault),
}

impl ContractOutcome {
    fn from_bool(holds: bool) -> Self {
        if holds {
            ContractOutcome::Holds
        } else {
            ContractOutcome::Violated
        }
    }
}

pub trait ObjectContract: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of values the contract ranges over.
    fn arity(&self) -> usize;

    /// Human-readable statement of the property.
    fn description(&self) -> &'static str;

    /// Evaluate on `values.len() == arity()` objects. Values that are not
    /// objects, or a tuple of the wrong length, make the contract vacuously
    /// hold.
    fn evaluate(&self, values: &[Value]) -> ContractOutcome;

    /// Whether a fault raised during evaluation is itself a violation. When
    /// false such a fault is ignored.
    fn eval_exception_means_failure(&self) -> bool {
        false
    }

    /// Boolean source expression asserting the property over `vars`.
    fn to_code(&self, vars: &[String]) -> String;
}

/// Reject contracts whose arity the visitors cannot enumerate.
pub fn validate_contracts(contracts: &[Arc<dyn ObjectContract>]) -> Result<(), ContractError> {
    for contract in contracts {
        let arity = contract.arity();
        if arity == 0 || arity > MAX_CONTRACT_ARITY {
            return Err(ContractError::Arity {
                name: contract.name(),
                arity,
            });
        }
    }
    Ok(())
}

/// The contracts checked when nothing else is configured.
pub fn default_contracts() -> Vec<Arc<dyn ObjectContract>> {
    vec![
        Arc::new(EqualsReflexive),
        Arc::new(EqualsToNullRetFalse),
        Arc::new(EqualsHashcode),
        Arc::new(EqualsSymmetric),
        Arc::new(HashCodeReturnsNormally),
        Arc::new(ToStringReturnsNormally),
    ]
}

/// The objects behind `values`, or `None` unless there are exactly
/// `arity` of them.
fn objects(values: &[Value], arity: usize) -> Option<Vec<&Arc<dyn RuntimeObject>>> {
    if values.len() != arity {
        return None;
    }
    values.iter().map(Value::as_object).collect()
}

// ── Unary ────────────────────────────────────────────────────────────

/// `o.equals(o)`
#[derive(Debug, Clone, Copy)]
pub struct EqualsReflexive;

impl ObjectContract for EqualsReflexive {
    fn name(&self) -> &'static str {
        "EqualsReflexive"
    }

    fn arity(&self) -> usize {
        1
    }

    fn description(&self) -> &'static str {
        "equals-reflexive on o"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        match objs[0].equals(&values[0]) {
            Ok(holds) => ContractOutcome::from_bool(holds),
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!("{0}.equals({0})", vars[0])
    }
}

/// `!o.equals(null)`
#[derive(Debug, Clone, Copy)]
pub struct EqualsToNullRetFalse;

impl ObjectContract for EqualsToNullRetFalse {
    fn name(&self) -> &'static str {
        "EqualsToNullRetFalse"
    }

    fn arity(&self) -> usize {
        1
    }

    fn description(&self) -> &'static str {
        "equals(null) returns false on o"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        match objs[0].equals(&Value::Null) {
            Ok(equal) => ContractOutcome::from_bool(!equal),
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!("!{}.equals(null)", vars[0])
    }
}

/// `o.hashCode()` does not throw.
#[derive(Debug, Clone, Copy)]
pub struct HashCodeReturnsNormally;

impl ObjectContract for HashCodeReturnsNormally {
    fn name(&self) -> &'static str {
        "HashCodeReturnsNormally"
    }

    fn arity(&self) -> usize {
        1
    }

    fn description(&self) -> &'static str {
        "hashCode() throws no exception on o"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        match objs[0].hash_code() {
            Ok(_) => ContractOutcome::Holds,
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!("{0}.hashCode() == {0}.hashCode()", vars[0])
    }
}

/// `o.toString()` does not throw.
#[derive(Debug, Clone, Copy)]
pub struct ToStringReturnsNormally;

impl ObjectContract for ToStringReturnsNormally {
    fn name(&self) -> &'static str {
        "ToStringReturnsNormally"
    }

    fn arity(&self) -> usize {
        1
    }

    fn description(&self) -> &'static str {
        "toString() throws no exception on o"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        match objs[0].to_display_string() {
            Ok(_) => ContractOutcome::Holds,
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn eval_exception_means_failure(&self) -> bool {
        true
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!("{0}.toString() != null", vars[0])
    }
}

// ── Binary ───────────────────────────────────────────────────────────

/// `o1.equals(o2)` implies equal hash codes.
#[derive(Debug, Clone, Copy)]
pub struct EqualsHashcode;

impl ObjectContract for EqualsHashcode {
    fn name(&self) -> &'static str {
        "EqualsHashcode"
    }

    fn arity(&self) -> usize {
        2
    }

    fn description(&self) -> &'static str {
        "equals and hashCode are consistent"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        let check = || -> Result<bool, Fault> {
            if !objs[0].equals(&values[1])? {
                return Ok(true);
            }
            Ok(objs[0].hash_code()? == objs[1].hash_code()?)
        };
        match check() {
            Ok(holds) => ContractOutcome::from_bool(holds),
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!(
            "{0}.equals({1}) ? {0}.hashCode() == {1}.hashCode() : true",
            vars[0], vars[1]
        )
    }
}

/// `o1.equals(o2)` implies `o2.equals(o1)`.
#[derive(Debug, Clone, Copy)]
pub struct EqualsSymmetric;

impl ObjectContract for EqualsSymmetric {
    fn name(&self) -> &'static str {
        "EqualsSymmetric"
    }

    fn arity(&self) -> usize {
        2
    }

    fn description(&self) -> &'static str {
        "equals is symmetric"
    }

    fn evaluate(&self, values: &[Value]) -> ContractOutcome {
        let Some(objs) = objects(values, self.arity()) else {
            return ContractOutcome::Holds;
        };
        let check = || -> Result<bool, Fault> {
            if !objs[0].equals(&values[1])? {
                return Ok(true);
            }
            objs[1].equals(&values[0])
        };
        match check() {
            Ok(holds) => ContractOutcome::from_bool(holds),
            Err(fault) => ContractOutcome::Threw(fault),
        }
    }

    fn to_code(&self, vars: &[String]) -> String {
        format!("{0}.equals({1}) == {1}.equals({0})", vars[0], vars[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use tessel_ir::{Type, TypeRegistry};

    #[derive(Debug)]
    struct Hostile {
        ty: Type,
    }

    impl RuntimeObject for Hostile {
        fn runtime_type(&self) -> Type {
            self.ty.clone()
        }

        fn equals(&self, _other: &Value) -> Result<bool, Fault> {
            Ok(false)
        }

        fn hash_code(&self) -> Result<i32, Fault> {
            Err(Fault::new("java.lang.IllegalStateException", Some("no hash")))
        }

        fn to_display_string(&self) -> Result<String, Fault> {
            Ok("hostile".to_string())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn hostile() -> Value {
        Value::object(Hostile {
            ty: TypeRegistry::new().object(),
        })
    }

    #[test]
    fn test_reflexive_violation() {
        let v = hostile();
        assert_eq!(EqualsReflexive.evaluate(&[v.clone()]), ContractOutcome::Violated);
        assert_eq!(EqualsToNullRetFalse.evaluate(&[v]), ContractOutcome::Holds);
    }

    #[test]
    fn test_hash_code_fault_is_reported() {
        let outcome = HashCodeReturnsNormally.evaluate(&[hostile()]);
        assert!(matches!(outcome, ContractOutcome::Threw(ref f) if f.class_name == "java.lang.IllegalStateException"));
        assert!(HashCodeReturnsNormally.eval_exception_means_failure());
        assert!(!EqualsReflexive.eval_exception_means_failure());
    }

    #[test]
    fn test_non_objects_hold_vacuously() {
        for contract in default_contracts() {
            let values = vec![Value::Int(1); contract.arity()];
            assert_eq!(contract.evaluate(&values), ContractOutcome::Holds, "{}", contract.name());
        }
    }

    #[test]
    fn test_wrong_tuple_length_holds() {
        for contract in default_contracts() {
            assert_eq!(contract.evaluate(&[]), ContractOutcome::Holds, "{}", contract.name());
        }
        assert_eq!(EqualsSymmetric.evaluate(&[hostile()]), ContractOutcome::Holds);
        assert_eq!(
            EqualsReflexive.evaluate(&[hostile(), hostile()]),
            ContractOutcome::Holds
        );
    }

    #[test]
    fn test_binary_contracts_short_circuit_on_unequal() {
        let (a, b) = (hostile(), hostile());
        assert_eq!(EqualsSymmetric.evaluate(&[a.clone(), b.clone()]), ContractOutcome::Holds);
        assert_eq!(EqualsHashcode.evaluate(&[a, b]), ContractOutcome::Holds);
    }

    #[test]
    fn test_code_rendering() {
        let vars = vec!["var1".to_string(), "var2".to_string()];
        assert_eq!(EqualsReflexive.to_code(&vars), "var1.equals(var1)");
        assert_eq!(EqualsSymmetric.to_code(&vars), "var1.equals(var2) == var2.equals(var1)");
    }

    #[derive(Debug)]
    struct Quaternary;

    impl ObjectContract for Quaternary {
        fn name(&self) -> &'static str {
            "Quaternary"
        }
        fn arity(&self) -> usize {
            4
        }
        fn description(&self) -> &'static str {
            "too wide"
        }
        fn evaluate(&self, _values: &[Value]) -> ContractOutcome {
            ContractOutcome::Holds
        }
        fn to_code(&self, _vars: &[String]) -> String {
            String::new()
        }
    }

    #[test]
    fn test_arity_limit() {
        assert!(validate_contracts(&default_contracts()).is_ok());
        let wide: Vec<Arc<dyn ObjectContract>> = vec![Arc::new(Quaternary)];
        assert!(matches!(
            validate_contracts(&wide),
            Err(ContractError::Arity { arity: 4, .. })
        ));
    }
}
