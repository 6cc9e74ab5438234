//! Checks: assertions attached to a statement index after execution.

use serde::{Deserialize, Serialize};
use tessel_sequence::{variable_name, StatementDecorator};

/// How a captured primitive value is compared in emitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintMode {
    /// `var == value`, for unboxed primitives.
    Eq,
    /// `var.equals(value)`, for boxed primitives and strings.
    Equals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Check {
    /// An object contract failed on the listed variables.
    ContractViolation {
        contract: String,
        description: String,
        vars: Vec<usize>,
        code: String,
    },
    /// The statement threw an exception that reveals a fault.
    NoException { class_name: String },
    /// The statement threw, and that is recorded as current behavior.
    ExpectedException { class_name: String },
    IsNull { var: usize },
    IsNotNull { var: usize },
    PrimValue {
        var: usize,
        value: String,
        mode: PrintMode,
    },
}

impl Check {
    /// Contract violations and fault-revealing exceptions are failures;
    /// everything else captures regression behavior.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Check::ContractViolation { .. } | Check::NoException { .. }
        )
    }

    /// Name of the violated property, for failing checks only.
    pub fn violation_kind(&self) -> Option<&str> {
        match self {
            Check::ContractViolation { contract, .. } => Some(contract),
            Check::NoException { class_name } => Some(class_name),
            _ => None,
        }
    }

    pub fn pre_code(&self) -> Vec<String> {
        match self {
            Check::ExpectedException { .. } => vec!["try {".to_string()],
            Check::NoException { class_name } => vec![format!(
                "// This statement throws {class_name}, which reveals a fault."
            )],
            _ => Vec::new(),
        }
    }

    pub fn post_code(&self) -> Vec<String> {
        match self {
            Check::ContractViolation {
                description, code, ..
            } => vec![format!(
                "assertTrue(\"Contract failed: {description}\", {code});"
            )],
            Check::NoException { .. } => Vec::new(),
            Check::ExpectedException { class_name } => vec![
                format!("  fail(\"Expected exception of type {class_name}\");"),
                format!("}} catch ({class_name} e) {{"),
                "  // Expected exception.".to_string(),
                "}".to_string(),
            ],
            Check::IsNull { var } => vec![format!("assertNull({});", variable_name(*var))],
            Check::IsNotNull { var } => {
                vec![format!("assertNotNull({});", variable_name(*var))]
            }
            Check::PrimValue { var, value, mode } => {
                let name = variable_name(*var);
                vec![match mode {
                    PrintMode::Eq => format!("assertTrue({name} == {value});"),
                    PrintMode::Equals => {
                        format!("assertEquals({value}, {name});")
                    }
                }]
            }
        }
    }
}

/// All checks attached to one statement index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestChecks {
    checks: Vec<Check>,
}

impl TestChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, check: Check) {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn has_failure(&self) -> bool {
        self.checks.iter().any(Check::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.is_failure())
    }

    pub fn clear(&mut self) {
        self.checks.clear();
    }
}

/// Renders each index's checks around its statement.
pub struct CheckDecorator<'a> {
    checks: &'a [TestChecks],
}

impl<'a> CheckDecorator<'a> {
    pub fn new(checks: &'a [TestChecks]) -> Self {
        Self { checks }
    }
}

impl StatementDecorator for CheckDecorator<'_> {
    fn pre_statement(&self, index: usize) -> Vec<String> {
        self.checks
            .get(index)
            .map(|tc| tc.checks().iter().flat_map(Check::pre_code).collect())
            .unwrap_or_default()
    }

    fn post_statement(&self, index: usize) -> Vec<String> {
        self.checks
            .get(index)
            .map(|tc| tc.checks().iter().flat_map(Check::post_code).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        let violation = Check::ContractViolation {
            contract: "EqualsReflexive".to_string(),
            description: "equals-reflexive on o".to_string(),
            vars: vec![0],
            code: "var0.equals(var0)".to_string(),
        };
        assert!(violation.is_failure());
        assert_eq!(violation.violation_kind(), Some("EqualsReflexive"));
        assert!(!Check::IsNull { var: 0 }.is_failure());
        assert!(Check::ExpectedException {
            class_name: "X".to_string()
        }
        .violation_kind()
        .is_none());
    }

    #[test]
    fn test_duplicate_checks_collapse() {
        let mut tc = TestChecks::new();
        tc.add(Check::IsNotNull { var: 2 });
        tc.add(Check::IsNotNull { var: 2 });
        assert_eq!(tc.checks().len(), 1);
        assert!(!tc.has_failure());
    }

    #[test]
    fn test_expected_exception_wraps_statement() {
        let check = Check::ExpectedException {
            class_name: "java.lang.IllegalArgumentException".to_string(),
        };
        assert_eq!(check.pre_code(), vec!["try {"]);
        let post = check.post_code();
        assert_eq!(post.len(), 4);
        assert_eq!(post[1], "} catch (java.lang.IllegalArgumentException e) {");
    }

    #[test]
    fn test_prim_value_modes() {
        let eq = Check::PrimValue {
            var: 3,
            value: "10".to_string(),
            mode: PrintMode::Eq,
        };
        let equals = Check::PrimValue {
            var: 3,
            value: "\"hi\"".to_string(),
            mode: PrintMode::Equals,
        };
        assert_eq!(eq.post_code(), vec!["assertTrue(var3 == 10);"]);
        assert_eq!(equals.post_code(), vec!["assertEquals(\"hi\", var3);"]);
    }
}
