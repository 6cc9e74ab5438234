use crate::literal::parse_typed_literal;
use crate::operation::{Operation, OperationError};
use crate::types::{Type, TypeError, TypeRegistry};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("Malformed literal '{text}': {reason}")]
    Literal { text: String, reason: String },

    #[error("Malformed {kind} descriptor '{descriptor}'")]
    Descriptor { kind: String, descriptor: String },

    #[error("Unknown statement kind: {0}")]
    UnknownKind(String),

    #[error("Line {line}: {reason}")]
    LiteralsFile { line: usize, reason: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rebuild an operation from its kind id and descriptor.
pub fn parse_operation(
    kind: &str,
    descriptor: &str,
    registry: &TypeRegistry,
) -> Result<Operation, ParseError> {
    let descriptor = descriptor.trim();
    let malformed = || ParseError::Descriptor {
        kind: kind.to_string(),
        descriptor: descriptor.to_string(),
    };
    let (is_static, body) = match descriptor.strip_prefix("static ") {
        Some(rest) => (true, rest),
        None => (false, descriptor),
    };

    match kind {
        "prim" => {
            let (ty, value) = parse_typed_literal(descriptor, registry)?;
            Ok(Operation::literal(&ty, value)?)
        }
        "cons" => {
            let (head, params) = split_params(body).ok_or_else(malformed)?;
            let declaring = head.strip_suffix(".<init>").ok_or_else(malformed)?;
            if !params.1.is_empty() {
                return Err(malformed());
            }
            Ok(Operation::constructor(
                &registry.resolve(declaring)?,
                parse_type_list(params.0, registry)?,
            ))
        }
        "method" => {
            let (head, (params, rest)) = split_params(body).ok_or_else(malformed)?;
            let returns = rest.strip_prefix("->").ok_or_else(malformed)?;
            let (declaring, name) = head.rsplit_once('.').ok_or_else(malformed)?;
            let declaring = registry.resolve(declaring)?;
            let params = parse_type_list(params, registry)?;
            let returns = registry.resolve(returns)?;
            Ok(if is_static {
                Operation::static_method(&declaring, name, params, &returns)
            } else {
                Operation::method(&declaring, name, params, &returns)
            })
        }
        "getter" | "setter" => {
            let (member, field_type) = body.split_once(':').ok_or_else(malformed)?;
            let (declaring, name) = member.rsplit_once('.').ok_or_else(malformed)?;
            let declaring = registry.resolve(declaring)?;
            let field_type = registry.resolve(field_type)?;
            Ok(if kind == "getter" {
                Operation::getter(&declaring, name, &field_type, is_static)
            } else {
                Operation::setter(&declaring, name, &field_type, is_static)
            })
        }
        "array" => {
            let (array_type, length) = descriptor.rsplit_once(':').ok_or_else(malformed)?;
            let array_type = registry.resolve(array_type)?;
            let element = array_type.element_type().ok_or_else(malformed)?;
            let length = length.trim().parse::<usize>().map_err(|_| malformed())?;
            Ok(Operation::array(element, length)?)
        }
        "enum" => {
            let (declaring, name) = descriptor.rsplit_once('.').ok_or_else(malformed)?;
            let declaring = registry.resolve(declaring)?;
            if !declaring.is_enum() {
                return Err(malformed());
            }
            Ok(Operation::enum_constant(&declaring, name))
        }
        other => Err(ParseError::UnknownKind(other.to_string())),
    }
}

/// Split `head(params)rest` into `(head, (params, rest))`.
fn split_params(s: &str) -> Option<(&str, (&str, &str))> {
    let open = s.find('(')?;
    let close = open + s[open..].find(')')?;
    Some((&s[..open], (&s[open + 1..close], &s[close + 1..])))
}

pub fn parse_type_list(list: &str, registry: &TypeRegistry) -> Result<Vec<Type>, ParseError> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(|name| registry.resolve(name).map_err(ParseError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::LiteralValue;
    use crate::types::{ClassDecl, ClassKind, PrimitiveKind};

    fn registry() -> TypeRegistry {
        let mut reg = TypeRegistry::new();
        reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        reg.declare(&ClassDecl::class("pkg.Color").with_kind(ClassKind::Enum))
            .unwrap();
        reg
    }

    #[test]
    fn test_descriptor_round_trip_all_kinds() {
        let reg = registry();
        let foo = reg.resolve("pkg.Foo").unwrap();
        let int = reg.primitive(PrimitiveKind::Int);
        let ops = vec![
            Operation::constructor(&foo, vec![int.clone(), reg.string()]),
            Operation::constructor(&foo, vec![]),
            Operation::method(&foo, "bar", vec![int.clone()], &reg.primitive(PrimitiveKind::Boolean)),
            Operation::static_method(&foo, "make", vec![], &foo),
            Operation::getter(&foo, "count", &int, false),
            Operation::setter(&foo, "count", &int, true),
            Operation::literal(&reg.string(), LiteralValue::Str("a : b".into())).unwrap(),
            Operation::literal(&foo, LiteralValue::Null).unwrap(),
            Operation::array(&foo, 2).unwrap(),
            Operation::enum_constant(&reg.resolve("pkg.Color").unwrap(), "RED"),
        ];
        for op in ops {
            let parsed = parse_operation(op.kind_id(), &op.descriptor(), &reg).unwrap();
            assert_eq!(parsed, op, "descriptor {}", op.descriptor());
        }
    }

    #[test]
    fn test_malformed_descriptors() {
        let reg = registry();
        assert!(matches!(
            parse_operation("cons", "pkg.Foo(int)", &reg),
            Err(ParseError::Descriptor { .. })
        ));
        assert!(matches!(
            parse_operation("method", "pkg.Foo.bar(int)", &reg),
            Err(ParseError::Descriptor { .. })
        ));
        assert!(matches!(
            parse_operation("method", "pkg.Nope.bar()->int", &reg),
            Err(ParseError::Type(TypeError::Unknown(_)))
        ));
        assert!(matches!(
            parse_operation("enum", "pkg.Foo.RED", &reg),
            Err(ParseError::Descriptor { .. })
        ));
        assert!(matches!(
            parse_operation("lambda", "x", &reg),
            Err(ParseError::UnknownKind(_))
        ));
    }
}
