//! JSON loader for an operation universe: the declared classes, the
//! operations generation may select, and the seed literals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::literal::parse_typed_literal;
use crate::operation::Operation;
use crate::parse::{parse_operation, ParseError};
use crate::types::{ClassDecl, Type, TypeRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDecl {
    pub kind: String,
    pub descriptor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UniverseFile {
    #[serde(default)]
    classes: Vec<ClassDecl>,
    #[serde(default)]
    operations: Vec<OperationDecl>,
    /// Extra seed literals in `TYPE:VALUE` form.
    #[serde(default)]
    literals: Vec<String>,
    /// Class name -> literals scoped to that class.
    #[serde(default)]
    class_literals: BTreeMap<String, Vec<String>>,
}

/// A resolved universe, ready to hand to a generator.
#[derive(Debug, Clone)]
pub struct Universe {
    pub registry: TypeRegistry,
    pub operations: Vec<Operation>,
    pub seeds: Vec<Operation>,
    pub class_literals: BTreeMap<Type, Vec<Operation>>,
}

impl Universe {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let file: UniverseFile = serde_json::from_str(json)?;

        let mut registry = TypeRegistry::new();
        for decl in &file.classes {
            registry.declare(decl)?;
        }

        let operations = file
            .operations
            .iter()
            .map(|decl| parse_operation(&decl.kind, &decl.descriptor, &registry))
            .collect::<Result<Vec<_>, _>>()?;

        let literal = |text: &String| -> Result<Operation, ParseError> {
            let (ty, value) = parse_typed_literal(text, &registry)?;
            Ok(Operation::literal(&ty, value)?)
        };
        let seeds = file.literals.iter().map(literal).collect::<Result<Vec<_>, _>>()?;

        let mut class_literals = BTreeMap::new();
        for (class, texts) in &file.class_literals {
            let ty = registry.resolve(class)?;
            let ops = texts.iter().map(literal).collect::<Result<Vec<_>, _>>()?;
            class_literals.insert(ty, ops);
        }

        Ok(Self {
            registry,
            operations,
            seeds,
            class_literals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_universe() {
        let json = r#"{
            "classes": [{"name": "pkg.Counter"}],
            "operations": [
                {"kind": "cons", "descriptor": "pkg.Counter.<init>()"},
                {"kind": "method", "descriptor": "pkg.Counter.add(int)->void"},
                {"kind": "getter", "descriptor": "pkg.Counter.value:int"}
            ],
            "literals": ["int:5", "java.lang.String:\"seed\""],
            "class_literals": {"pkg.Counter": ["int:42"]}
        }"#;
        let universe = Universe::from_json(json).unwrap();
        assert_eq!(universe.operations.len(), 3);
        assert_eq!(universe.seeds.len(), 2);
        let counter = universe.registry.resolve("pkg.Counter").unwrap();
        assert_eq!(universe.class_literals[&counter].len(), 1);
        assert!(universe.operations[0].is_constructor());
    }

    #[test]
    fn test_unknown_operation_type_fails() {
        let json = r#"{"operations": [{"kind": "cons", "descriptor": "pkg.Nope.<init>()"}]}"#;
        assert!(Universe::from_json(json).is_err());
    }
}
