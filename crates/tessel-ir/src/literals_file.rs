//! Reader for class-scoped literal files.
//!
//! ```text
//! START CLASSLITERALS
//! CLASSNAME
//! pkg.Foo
//! LITERALS
//! int:3
//! java.lang.String:"hello"
//! END CLASSLITERALS
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. A class may appear
//! in several records; its literals accumulate.

use std::collections::BTreeMap;

use crate::literal::parse_typed_literal;
use crate::operation::Operation;
use crate::parse::ParseError;
use crate::types::{Type, TypeRegistry};

const START: &str = "START CLASSLITERALS";
const END: &str = "END CLASSLITERALS";
const CLASSNAME: &str = "CLASSNAME";
const LITERALS: &str = "LITERALS";

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Outside,
    ExpectClassname,
    ExpectClass,
    ExpectLiteralsHeader,
    InLiterals,
}

/// Parse a literals file into per-class literal operations.
pub fn parse_literals_file(
    text: &str,
    registry: &TypeRegistry,
) -> Result<BTreeMap<Type, Vec<Operation>>, ParseError> {
    let mut result: BTreeMap<Type, Vec<Operation>> = BTreeMap::new();
    let mut state = State::Outside;
    let mut current: Option<Type> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |reason: String| ParseError::LiteralsFile {
            line: line_no,
            reason,
        };

        state = match (state, line) {
            (State::Outside, START) => State::ExpectClassname,
            (State::Outside, other) => {
                return Err(err(format!("expected '{START}', found '{other}'")));
            }
            (State::ExpectClassname, CLASSNAME) => State::ExpectClass,
            (State::ExpectClassname, other) => {
                return Err(err(format!("expected '{CLASSNAME}', found '{other}'")));
            }
            (State::ExpectClass, name) => {
                let ty = registry.resolve(name).map_err(|e| err(e.to_string()))?;
                if ty.class_info().is_none() {
                    return Err(err(format!("'{name}' is not a class")));
                }
                result.entry(ty.clone()).or_default();
                current = Some(ty);
                State::ExpectLiteralsHeader
            }
            (State::ExpectLiteralsHeader, LITERALS) => State::InLiterals,
            (State::ExpectLiteralsHeader, other) => {
                return Err(err(format!("expected '{LITERALS}', found '{other}'")));
            }
            (State::InLiterals, END) => {
                current = None;
                State::Outside
            }
            (State::InLiterals, literal) => {
                let (ty, value) =
                    parse_typed_literal(literal, registry).map_err(|e| err(e.to_string()))?;
                let op = Operation::literal(&ty, value).map_err(|e| err(e.to_string()))?;
                if let Some(class) = &current {
                    result.entry(class.clone()).or_default().push(op);
                }
                State::InLiterals
            }
        };
    }

    if state != State::Outside {
        return Err(ParseError::LiteralsFile {
            line: text.lines().count(),
            reason: format!("missing '{END}'"),
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralValue;
    use crate::types::ClassDecl;

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        reg.declare(&ClassDecl::class("pkg.Bar")).unwrap();
        reg
    }

    #[test]
    fn test_parse_two_records() {
        let text = "\
# literals mined from pkg
START CLASSLITERALS
CLASSNAME
pkg.Foo
LITERALS
int:3
java.lang.String:\"x y\"
END CLASSLITERALS

START CLASSLITERALS
CLASSNAME
pkg.Bar
LITERALS
long:-1
END CLASSLITERALS
";
        let reg = registry();
        let parsed = parse_literals_file(text, &reg).unwrap();
        let foo = reg.resolve("pkg.Foo").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&foo].len(), 2);
        assert_eq!(
            parsed[&foo][0].literal_value(),
            Some(&LiteralValue::Int(3))
        );
    }

    #[test]
    fn test_missing_end_is_error() {
        let text = "START CLASSLITERALS\nCLASSNAME\npkg.Foo\nLITERALS\nint:1\n";
        let err = parse_literals_file(text, &registry()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_bad_literal_reports_line() {
        let text = "START CLASSLITERALS\nCLASSNAME\npkg.Foo\nLITERALS\nint:oops\nEND CLASSLITERALS\n";
        match parse_literals_file(text, &registry()) {
            Err(ParseError::LiteralsFile { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected literals file error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_class_is_error() {
        let text = "START CLASSLITERALS\nCLASSNAME\npkg.Missing\nLITERALS\nEND CLASSLITERALS\n";
        assert!(parse_literals_file(text, &registry()).is_err());
    }
}
