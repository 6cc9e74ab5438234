//! Line-oriented text form of a sequence.
//!
//! ```text
//! var0 = prim : int:3 :
//! var1 = cons : pkg.Foo.<init>(int) : var0
//! var2 = method : pkg.Foo.add(int)->void : var1 var0
//! ```
//!
//! Files holding several sequences wrap each one in `START SEQUENCE` /
//! `END SEQUENCE` lines.

use std::collections::HashMap;
use std::sync::Arc;

use tessel_ir::parse::parse_operation;
use tessel_ir::TypeRegistry;

use crate::error::SequenceError;
use crate::sequence::{variable_name, Sequence};

const START: &str = "START SEQUENCE";
const END: &str = "END SEQUENCE";

impl Sequence {
    pub fn to_parseable_string(&self) -> String {
        let mut out = String::new();
        for (i, stmt) in self.statements().enumerate() {
            let op = stmt.operation();
            out.push_str(&format!(
                "{} = {} : {} :",
                variable_name(i),
                op.kind_id(),
                op.descriptor()
            ));
            for input in self.input_indices(i) {
                out.push(' ');
                out.push_str(&variable_name(input));
            }
            out.push('\n');
        }
        out
    }

    /// Parse the text form back into a sequence. Every statement is
    /// re-validated through `extend`, so arity and type errors surface here.
    pub fn parse(text: &str, registry: &TypeRegistry) -> Result<Self, SequenceError> {
        Self::parse_lines(text.lines().enumerate(), registry)
    }

    fn parse_lines<'a>(
        lines: impl Iterator<Item = (usize, &'a str)>,
        registry: &TypeRegistry,
    ) -> Result<Self, SequenceError> {
        let mut seq = Sequence::new();
        let mut names: HashMap<String, usize> = HashMap::new();

        for (idx, raw) in lines {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let syntax = |reason: String| SequenceError::Syntax {
                line: idx + 1,
                reason,
            };

            let (name, rhs) = line
                .split_once(" = ")
                .ok_or_else(|| syntax("missing '='".to_string()))?;
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(syntax(format!("invalid variable name '{name}'")));
            }
            if names.contains_key(name) {
                return Err(syntax(format!("variable '{name}' declared twice")));
            }

            let (kind, rest) = rhs
                .split_once(" : ")
                .ok_or_else(|| syntax("missing ':' after statement kind".to_string()))?;
            let (descriptor, inputs) = match rest.strip_suffix(" :") {
                Some(descriptor) => (descriptor, ""),
                None => rest
                    .rsplit_once(" : ")
                    .ok_or_else(|| syntax("missing ':' before inputs".to_string()))?,
            };

            let op = parse_operation(kind.trim(), descriptor, registry)?;
            let mut indices = Vec::new();
            for input in inputs.split_whitespace() {
                let index = names
                    .get(input)
                    .copied()
                    .ok_or_else(|| syntax(format!("undeclared variable '{input}'")))?;
                indices.push(index);
            }
            if indices.len() != op.arity() {
                return Err(SequenceError::Arity {
                    descriptor: op.descriptor(),
                    expected: op.arity(),
                    actual: indices.len(),
                });
            }

            seq = seq.extend_indices(Arc::new(op), &indices)?;
            names.insert(name.to_string(), seq.size() - 1);
        }
        Ok(seq)
    }
}

/// Render several sequences as a record-delimited file.
pub fn write_sequences(sequences: &[Sequence]) -> String {
    let mut out = String::new();
    for seq in sequences {
        out.push_str(START);
        out.push('\n');
        out.push_str(&seq.to_parseable_string());
        out.push_str(END);
        out.push('\n');
    }
    out
}

/// Parse a record-delimited file of sequences.
pub fn parse_sequences(text: &str, registry: &TypeRegistry) -> Result<Vec<Sequence>, SequenceError> {
    let mut sequences = Vec::new();
    let mut record: Option<Vec<(usize, &str)>> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        match record.as_mut() {
            _ if line.is_empty() => {}
            None if line == START => record = Some(Vec::new()),
            None => {
                return Err(SequenceError::Syntax {
                    line: idx + 1,
                    reason: format!("expected '{START}', found '{line}'"),
                });
            }
            Some(_) if line == END => {
                let lines = record.take().unwrap_or_default();
                sequences.push(Sequence::parse_lines(lines.into_iter(), registry)?);
            }
            Some(lines) => lines.push((idx, raw)),
        }
    }

    if record.is_some() {
        return Err(SequenceError::Syntax {
            line: text.lines().count(),
            reason: format!("missing '{END}'"),
        });
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::{LiteralValue, Operation, PrimitiveKind};

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        reg
    }

    fn sample(reg: &TypeRegistry) -> Sequence {
        let foo = reg.resolve("pkg.Foo").unwrap();
        let int = reg.primitive(PrimitiveKind::Int);
        Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(3)).unwrap()))
            .unwrap()
            .extend_indices(Arc::new(Operation::constructor(&foo, vec![int.clone()])), &[0])
            .unwrap()
            .extend_indices(
                Arc::new(Operation::method(&foo, "add", vec![int], &reg.void())),
                &[1, 0],
            )
            .unwrap()
    }

    #[test]
    fn test_parseable_string_shape() {
        let reg = registry();
        let text = sample(&reg).to_parseable_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "var0 = prim : int:3 :");
        assert_eq!(lines[1], "var1 = cons : pkg.Foo.<init>(int) : var0");
        assert_eq!(lines[2], "var2 = method : pkg.Foo.add(int)->void : var1 var0");
    }

    #[test]
    fn test_round_trip() {
        let reg = registry();
        let seq = sample(&reg);
        let parsed = Sequence::parse(&seq.to_parseable_string(), &reg).unwrap();
        assert_eq!(parsed, seq);
    }

    #[test]
    fn test_custom_names_accepted() {
        let reg = registry();
        let text = "x = prim : int:1 :\nfoo = cons : pkg.Foo.<init>(int) : x\n";
        let seq = Sequence::parse(text, &reg).unwrap();
        assert_eq!(seq.size(), 2);
        assert_eq!(seq.input_indices(1), vec![0]);
    }

    #[test]
    fn test_parse_errors() {
        let reg = registry();
        let cases = [
            "var0 prim : int:1 :",
            "var0 = prim int:1",
            "var0 = prim : int:1 :\nvar0 = prim : int:2 :",
            "var0 = cons : pkg.Foo.<init>(int) : var9",
        ];
        for text in cases {
            assert!(
                matches!(Sequence::parse(text, &reg), Err(SequenceError::Syntax { .. })),
                "expected syntax error for {text:?}"
            );
        }
        assert!(matches!(
            Sequence::parse("var0 = prim : int:1 :\nvar1 = cons : pkg.Foo.<init>(int) :", &reg),
            Err(SequenceError::Arity { .. })
        ));
        assert!(matches!(
            Sequence::parse("var0 = prim : java.lang.String:\"s\" :\nvar1 = cons : pkg.Foo.<init>(int) : var0", &reg),
            Err(SequenceError::IncompatibleInput { .. })
        ));
    }

    #[test]
    fn test_record_file_round_trip() {
        let reg = registry();
        let a = sample(&reg);
        let b = Sequence::null_or_zero(&reg.resolve("pkg.Foo").unwrap());
        let text = write_sequences(&[a.clone(), b.clone()]);
        let parsed = parse_sequences(&text, &reg).unwrap();
        assert_eq!(parsed, vec![a, b]);
        assert!(parse_sequences("START SEQUENCE\nvar0 = prim : int:1 :\n", &reg).is_err());
    }
}
