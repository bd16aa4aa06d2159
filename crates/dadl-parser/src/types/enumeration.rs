//! Enumerated value type.

use indexmap::IndexMap;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::types::Type;

/// Accepts only the enumerated texts; the mapped value (the text itself when
/// no mapping was declared) is dispatched through the underlying value type.
#[derive(Debug)]
pub struct EnumType {
    value_type: Type,
    values: IndexMap<String, String>,
}

impl EnumType {
    pub fn new(value_type: Type, values: IndexMap<String, String>) -> Self {
        Self { value_type, values }
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let text = text.trim();
        match self.values.get(text) {
            Some(mapped) => self.value_type.parse(builder, mapped, at),
            None => Err(ParseError::new(
                ParseErrorKind::InvalidValue,
                at,
                format!("unsupported enum value: {}", text),
            )),
        }
    }

    pub fn to_regex(&self) -> String {
        let alternatives: Vec<String> = self.values.keys().map(|k| regex::escape(k)).collect();
        format!("(?:{})", alternatives.join("|"))
    }
}
