//! Primitive, string and null literals, and the `TYPE:VALUE` syntax used by
//! seed files and the sequence text format.

use std::hash::{Hash, Hasher};

use crate::parse::ParseError;
use crate::types::{PrimitiveKind, Type, TypeRegistry};
use crate::value::Value;

/// Longest string accepted as a literal or promoted from a runtime value.
pub const MAX_STRING_LITERAL_LEN: usize = 10_000;

#[derive(Debug, Clone)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

// Floats compare by bit pattern so that literals are usable as map keys.
impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        use LiteralValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (Str(a), Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Null => {}
            LiteralValue::Bool(v) => v.hash(state),
            LiteralValue::Char(v) => v.hash(state),
            LiteralValue::Byte(v) => v.hash(state),
            LiteralValue::Short(v) => v.hash(state),
            LiteralValue::Int(v) => v.hash(state),
            LiteralValue::Long(v) => v.hash(state),
            LiteralValue::Float(v) => v.to_bits().hash(state),
            LiteralValue::Double(v) => v.to_bits().hash(state),
            LiteralValue::Str(v) => v.hash(state),
        }
    }
}

impl LiteralValue {
    /// The default "null or zero" literal for a type.
    pub fn null_or_zero(ty: &Type) -> Self {
        if ty.is_string() {
            return LiteralValue::Str(String::new());
        }
        match ty.primitive() {
            Some(PrimitiveKind::Boolean) => LiteralValue::Bool(false),
            Some(PrimitiveKind::Char) => LiteralValue::Char('a'),
            Some(PrimitiveKind::Byte) => LiteralValue::Byte(0),
            Some(PrimitiveKind::Short) => LiteralValue::Short(0),
            Some(PrimitiveKind::Int) => LiteralValue::Int(0),
            Some(PrimitiveKind::Long) => LiteralValue::Long(0),
            Some(PrimitiveKind::Float) => LiteralValue::Float(0.0),
            Some(PrimitiveKind::Double) => LiteralValue::Double(0.0),
            None => LiteralValue::Null,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::Null => LiteralValue::Null,
            Value::Bool(v) => LiteralValue::Bool(*v),
            Value::Char(v) => LiteralValue::Char(*v),
            Value::Byte(v) => LiteralValue::Byte(*v),
            Value::Short(v) => LiteralValue::Short(*v),
            Value::Int(v) => LiteralValue::Int(*v),
            Value::Long(v) => LiteralValue::Long(*v),
            Value::Float(v) => LiteralValue::Float(*v),
            Value::Double(v) => LiteralValue::Double(*v),
            Value::Str(v) => LiteralValue::Str(v.to_string()),
            _ => return None,
        })
    }

    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::Null => Value::Null,
            LiteralValue::Bool(v) => Value::Bool(*v),
            LiteralValue::Char(v) => Value::Char(*v),
            LiteralValue::Byte(v) => Value::Byte(*v),
            LiteralValue::Short(v) => Value::Short(*v),
            LiteralValue::Int(v) => Value::Int(*v),
            LiteralValue::Long(v) => Value::Long(*v),
            LiteralValue::Float(v) => Value::Float(*v),
            LiteralValue::Double(v) => Value::Double(*v),
            LiteralValue::Str(v) => Value::str(v),
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        self.to_value().primitive_kind()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LiteralValue::Null)
    }

    /// Whether this literal may be declared with type `ty`: primitives need
    /// their own primitive (or wrapper) type, strings need `String`, and
    /// every other reference type only admits `null`.
    pub fn matches_type(&self, ty: &Type) -> bool {
        match self {
            LiteralValue::Null => ty.is_reference(),
            LiteralValue::Str(_) => ty.is_string(),
            other => {
                let kind = other.primitive_kind();
                kind.is_some() && (ty.primitive() == kind || ty.unboxed() == kind)
            }
        }
    }

    /// Value half of the `TYPE:VALUE` form.
    pub fn render(&self) -> String {
        match self {
            LiteralValue::Null => "null".to_string(),
            LiteralValue::Bool(v) => v.to_string(),
            LiteralValue::Char(c) => format!("'{}'", escape(&c.to_string())),
            LiteralValue::Byte(v) => v.to_string(),
            LiteralValue::Short(v) => v.to_string(),
            LiteralValue::Int(v) => v.to_string(),
            LiteralValue::Long(v) => v.to_string(),
            LiteralValue::Float(v) => format!("{v:?}"),
            LiteralValue::Double(v) => format!("{v:?}"),
            LiteralValue::Str(s) => format!("\"{}\"", escape(s)),
        }
    }

    /// Source-code rendering of the literal.
    pub fn java_code(&self) -> String {
        match self {
            LiteralValue::Byte(v) => format!("(byte){v}"),
            LiteralValue::Short(v) => format!("(short){v}"),
            LiteralValue::Long(v) => format!("{v}L"),
            LiteralValue::Float(v) => float_code(
                v.is_nan(),
                v.is_infinite().then_some(*v > 0.0),
                format!("{v:?}"),
                "Float",
                "f",
            ),
            LiteralValue::Double(v) => float_code(
                v.is_nan(),
                v.is_infinite().then_some(*v > 0.0),
                format!("{v:?}"),
                "Double",
                "d",
            ),
            other => other.render(),
        }
    }

    /// Parse the value half of `TYPE:VALUE` against a declared type.
    pub fn parse(ty: &Type, text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        let bad = |reason: &str| ParseError::Literal {
            text: format!("{}:{}", ty.name(), text),
            reason: reason.to_string(),
        };
        if text == "null" {
            return if ty.is_reference() {
                Ok(LiteralValue::Null)
            } else {
                Err(bad("null is not a valid primitive value"))
            };
        }
        if ty.is_string() {
            let inner = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .ok_or_else(|| bad("string literal must be quoted"))?;
            let s = unescape(inner).map_err(|e| bad(&e))?;
            if !is_valid_string_literal(&s) {
                return Err(bad("string literal too long"));
            }
            return Ok(LiteralValue::Str(s));
        }
        let kind = ty
            .primitive()
            .or_else(|| ty.unboxed())
            .ok_or_else(|| bad("only primitives, strings and null are literals"))?;
        let num = |_: std::num::ParseIntError| bad("invalid integer");
        let float = |_: std::num::ParseFloatError| bad("invalid floating-point number");
        Ok(match kind {
            PrimitiveKind::Boolean => match text {
                "true" => LiteralValue::Bool(true),
                "false" => LiteralValue::Bool(false),
                _ => return Err(bad("invalid boolean")),
            },
            PrimitiveKind::Char => {
                let inner = text
                    .strip_prefix('\'')
                    .and_then(|t| t.strip_suffix('\''))
                    .ok_or_else(|| bad("char literal must be single-quoted"))?;
                let s = unescape(inner).map_err(|e| bad(&e))?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => LiteralValue::Char(c),
                    _ => return Err(bad("char literal must hold one character")),
                }
            }
            PrimitiveKind::Byte => LiteralValue::Byte(text.parse().map_err(num)?),
            PrimitiveKind::Short => LiteralValue::Short(text.parse().map_err(num)?),
            PrimitiveKind::Int => LiteralValue::Int(text.parse().map_err(num)?),
            PrimitiveKind::Long => {
                let digits = text.strip_suffix(['L', 'l']).unwrap_or(text);
                LiteralValue::Long(digits.parse().map_err(num)?)
            }
            PrimitiveKind::Float => LiteralValue::Float(text.parse().map_err(float)?),
            PrimitiveKind::Double => LiteralValue::Double(text.parse().map_err(float)?),
        })
    }
}

fn float_code(nan: bool, infinite: Option<bool>, repr: String, class: &str, suffix: &str) -> String {
    match (nan, infinite) {
        (true, _) => format!("{class}.NaN"),
        (_, Some(true)) => format!("{class}.POSITIVE_INFINITY"),
        (_, Some(false)) => format!("{class}.NEGATIVE_INFINITY"),
        _ => format!("{repr}{suffix}"),
    }
}

/// Parse a full `TYPE:VALUE` literal, e.g. `int:3` or `java.lang.String:"hi"`.
pub fn parse_typed_literal(
    text: &str,
    registry: &TypeRegistry,
) -> Result<(Type, LiteralValue), ParseError> {
    let (type_name, value) = text.split_once(':').ok_or_else(|| ParseError::Literal {
        text: text.to_string(),
        reason: "expected TYPE:VALUE".to_string(),
    })?;
    let ty = registry.resolve(type_name)?;
    let literal = LiteralValue::parse(&ty, value)?;
    Ok((ty, literal))
}

pub fn is_valid_string_literal(s: &str) -> bool {
    s.chars().count() <= MAX_STRING_LITERAL_LEN
}

/// Escape a string for quoting. `:` is escaped too, so a rendered literal
/// never contains the ` : ` field separator of the sequence text format.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ':' => out.push_str("\\u003a"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
    }
    out
}

pub fn unescape(s: &str) -> Result<String, String> {
    let mut units: Vec<u16> = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    let mut buf = [0u16; 2];
    while let Some(c) = chars.next() {
        if c != '\\' {
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }
        let escaped = match chars.next() {
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return Err(format!("truncated unicode escape '\\u{hex}'"));
                }
                let unit = u16::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape '\\u{hex}'"))?;
                units.push(unit);
                continue;
            }
            Some(other) => return Err(format!("unknown escape '\\{other}'")),
            None => return Err("dangling backslash".to_string()),
        };
        units.extend_from_slice(escaped.encode_utf16(&mut buf));
    }
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| format!("invalid UTF-16 in escape: {e}"))
}
