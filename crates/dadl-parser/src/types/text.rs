//! String-like value types.

use std::cell::Cell;

use crate::builder::Builder;
use crate::error::Result;
use crate::parser::leading_whitespace_width;
use crate::types::{NodeInfo, RegexCtx, Type};
use crate::value::Value;

/// Pattern accepted for identifiers (and for unquoted struct keys).
pub const IDENTIFIER_PATTERN: &str = "[A-Za-z0-9_-]+";

/// String value. An optional pattern shapes the regex this type contributes
/// to enclosing formulas; the inline parse itself accepts any text.
///
/// Multi-line form: an inline parse resets `indent_lock`; the first child
/// line then locks the indentation width to strip from itself and every
/// following line, so deeper inner indentation survives verbatim.
#[derive(Debug)]
pub struct StrType {
    regex: Option<String>,
    indent_lock: Cell<Option<usize>>,
}

impl StrType {
    pub fn plain() -> Self {
        Self {
            regex: None,
            indent_lock: Cell::new(None),
        }
    }

    pub fn with_regex(pattern: &str) -> Self {
        Self {
            regex: Some(pattern.to_string()),
            indent_lock: Cell::new(None),
        }
    }

    pub fn parse(&self, builder: &Builder, text: &str) -> Result<()> {
        builder.set_simple(Value::String(text.trim().to_string()));
        self.indent_lock.set(None);
        Ok(())
    }

    pub fn parse_child(&self, self_ty: &Type, builder: &Builder, line: &str) -> Result<NodeInfo> {
        let lock = match self.indent_lock.get() {
            Some(width) => width,
            None => {
                let width = leading_whitespace_width(line);
                self.indent_lock.set(Some(width));
                width
            }
        };
        let stripped: String = strip_indent(line, lock);

        match builder.get_simple() {
            Some(Value::String(existing)) if !existing.is_empty() => {
                builder.set_simple(Value::String(format!("{}\n{}", existing, stripped)));
            }
            _ => builder.set_simple(Value::String(stripped)),
        }
        Ok(NodeInfo::new(self_ty.clone(), builder.clone()))
    }

    pub fn to_regex(&self) -> String {
        match &self.regex {
            Some(pattern) => pattern.clone(),
            None => RegexCtx::CUTOFF.to_string(),
        }
    }
}

/// Drop exactly `width` leading code points; the caller guarantees they are
/// the indentation discovered on the first continuation line.
fn strip_indent(line: &str, width: usize) -> String {
    line.chars().skip(width).collect()
}

/// Fixed literal inside a formula. Positional only: formula items built from
/// constants are unnamed, so the boolean this parse produces is never
/// written into a named field.
#[derive(Debug)]
pub struct ConstantType {
    value: String,
}

impl ConstantType {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn parse(&self, builder: &Builder, text: &str) -> Result<()> {
        builder.set_simple(Value::Bool(text == self.value));
        Ok(())
    }

    pub fn to_regex(&self) -> String {
        regex::escape(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Pos;

    #[test]
    fn inline_parse_trims() {
        let ty = Type::string();
        let builder = Builder::new_root();
        let field = builder.field_builder("s");
        ty.parse(&field, "  padded value \t", Pos::none()).unwrap();
        assert_eq!(field.get_simple(), Some(Value::String("padded value".into())));
    }

    #[test]
    fn continuation_lines_lock_first_indent() {
        let ty = Type::string();
        let builder = Builder::new_root();
        let field = builder.field_builder("s");
        ty.parse(&field, "", Pos::none()).unwrap();
        ty.parse_child(&field, "    first", Pos::none()).unwrap();
        ty.parse_child(&field, "        deeper", Pos::none()).unwrap();
        ty.parse_child(&field, "    last", Pos::none()).unwrap();

        assert_eq!(
            field.get_simple(),
            Some(Value::String("first\n    deeper\nlast".into()))
        );
    }

    #[test]
    fn reparsing_resets_the_lock() {
        let ty = Type::string();
        let builder = Builder::new_root();

        let a = builder.field_builder("a");
        ty.parse(&a, "", Pos::none()).unwrap();
        ty.parse_child(&a, "  one", Pos::none()).unwrap();

        // same type instance reused for a sibling with a wider indent
        let b = builder.field_builder("b");
        ty.parse(&b, "", Pos::none()).unwrap();
        ty.parse_child(&b, "      two", Pos::none()).unwrap();
        assert_eq!(b.get_simple(), Some(Value::String("two".into())));
    }
}
