//! Numeric and boolean value types.

use num_bigint::BigInt;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::value::Value;

/// Integer value with optional arbitrary-precision bounds.
///
/// The bounds select the representation, not a validation range: when the
/// declared `[min, max]` fits a signed 32-bit integer the parsed value is a
/// machine int, otherwise it is kept as a big integer.
#[derive(Debug)]
pub struct IntType {
    min: Option<BigInt>,
    max: Option<BigInt>,
}

impl IntType {
    pub fn new(min: Option<BigInt>, max: Option<BigInt>) -> Self {
        Self { min, max }
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let text = text.trim();
        if self.fits_machine_int() {
            let value: i64 = text.parse().map_err(|_| invalid_int(text, at))?;
            builder.set_simple(Value::Int(value));
        } else {
            let value: BigInt = text.parse().map_err(|_| invalid_int(text, at))?;
            builder.set_simple(Value::BigInt(value));
        }
        Ok(())
    }

    fn fits_machine_int(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => {
                *min >= BigInt::from(i32::MIN) && *max <= BigInt::from(i32::MAX)
            }
            _ => false,
        }
    }

    pub fn to_regex(&self) -> String {
        "(?:-)?\\d+".to_string()
    }
}

fn invalid_int(text: &str, at: Pos) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidValue,
        at,
        format!("invalid int value: {}", text),
    )
}

/// Decimal number value.
#[derive(Debug)]
pub struct NumberType;

impl NumberType {
    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let text = text.trim();
        let valid = !text.is_empty()
            && {
                let digits = text.strip_prefix('-').unwrap_or(text);
                !digits.is_empty()
                    && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
                    && digits.chars().filter(|c| *c == '.').count() <= 1
                    && !digits.ends_with('.')
            };
        let value: f64 = if valid { text.parse().ok() } else { None }.ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::InvalidValue,
                at,
                format!("invalid number value: {}", text),
            )
        })?;
        builder.set_simple(Value::Number(value));
        Ok(())
    }

    pub fn to_regex(&self) -> String {
        "-?(?:\\d*\\.\\d+|\\d+)".to_string()
    }
}

/// Boolean value; accepts exactly `true` and `false`.
#[derive(Debug)]
pub struct BoolType;

impl BoolType {
    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let value = match text.trim() {
            "true" => true,
            "false" => false,
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidValue,
                    at,
                    format!("invalid bool value: {}", other),
                ))
            }
        };
        builder.set_simple(Value::Bool(value));
        Ok(())
    }

    pub fn to_regex(&self) -> String {
        "(?:true)|(?:false)".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn parse_with(ty: &Type, text: &str) -> Result<Value> {
        let root = Builder::new_root();
        let field = root.field_builder("v");
        ty.parse(&field, text, Pos::none())?;
        Ok(field.get_simple().unwrap())
    }

    #[test]
    fn narrow_bounds_produce_machine_ints() {
        let ty = Type::int(Some(BigInt::from(0)), Some(BigInt::from(65535)));
        assert_eq!(parse_with(&ty, "9042").unwrap(), Value::Int(9042));
        assert_eq!(parse_with(&ty, "-7").unwrap(), Value::Int(-7));
    }

    #[test]
    fn wide_or_missing_bounds_produce_big_ints() {
        let unbounded = Type::int(None, None);
        assert_eq!(
            parse_with(&unbounded, "7").unwrap(),
            Value::BigInt(BigInt::from(7))
        );

        let wide = Type::int(
            Some(BigInt::from(0)),
            Some("99999999999999999999".parse::<BigInt>().unwrap()),
        );
        assert_eq!(
            parse_with(&wide, "99999999999999999999").unwrap(),
            Value::BigInt("99999999999999999999".parse().unwrap())
        );
    }

    #[test]
    fn non_numeric_int_is_rejected() {
        let ty = Type::int(None, None);
        let err = parse_with(&ty, "seven").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);
    }

    #[test]
    fn numbers_parse_and_validate() {
        let ty = Type::number();
        assert_eq!(parse_with(&ty, "0.5").unwrap(), Value::Number(0.5));
        assert_eq!(parse_with(&ty, "-12").unwrap(), Value::Number(-12.0));
        assert!(parse_with(&ty, "1.2.3").is_err());
        assert!(parse_with(&ty, "nan").is_err());
    }

    #[test]
    fn bool_accepts_only_true_false() {
        let ty = Type::bool();
        assert_eq!(parse_with(&ty, "true").unwrap(), Value::Bool(true));
        assert_eq!(parse_with(&ty, " false ").unwrap(), Value::Bool(false));
        assert!(parse_with(&ty, "TRUE").is_err());
    }
}
