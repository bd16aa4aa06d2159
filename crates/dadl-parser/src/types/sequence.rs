//! Sequence value type: a line-internal delimited list.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::types::{RegexCtx, Type};

/// Space- or separator-delimited list of items on a single line, parsed
/// right-recursively against a two-group `(first)(rest)?` regex.
#[derive(Debug)]
pub struct SequenceType {
    item: Type,
    separator: Option<String>,
    re: RefCell<Option<Rc<Regex>>>,
}

impl SequenceType {
    pub fn new(item: Type, separator: Option<String>) -> Self {
        Self {
            item,
            separator,
            re: RefCell::new(None),
        }
    }

    fn separator_regex(&self) -> String {
        match &self.separator {
            Some(sep) if !sep.is_empty() => regex::escape(sep),
            _ => "\\s".to_string(),
        }
    }

    fn compiled(&self, at: Pos) -> Result<Rc<Regex>> {
        if let Some(re) = self.re.borrow().as_ref() {
            return Ok(Rc::clone(re));
        }
        let sep = self.separator_regex();
        let item = self.item.to_regex(&RegexCtx::new());
        let pattern = format!(
            "^({item})(?:(?:{sep})((?:{item})(?:(?:{sep})(?:{item}))*))?$",
            item = item,
            sep = sep
        );
        let re = Rc::new(Regex::new(&pattern).map_err(|e| {
            ParseError::new(
                ParseErrorKind::InvalidSchemaFormat,
                at,
                format!("invalid sequence pattern: {}", e),
            )
        })?);
        *self.re.borrow_mut() = Some(Rc::clone(&re));
        Ok(re)
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let re = self.compiled(at)?;

        // peel off the head and recurse on the tail until it is exhausted
        let mut items: Vec<String> = Vec::new();
        let mut remaining = text.trim().to_string();
        loop {
            let tail = {
                let caps = re.captures(&remaining).ok_or_else(|| {
                    ParseError::new(
                        ParseErrorKind::NoMatch,
                        at,
                        format!("no sequence match for: {}", remaining),
                    )
                })?;
                items.push(caps.get(1).map(|m| m.as_str()).unwrap_or("").to_string());
                caps.get(2).map(|m| m.as_str().to_string())
            };
            match tail {
                Some(rest) if !rest.is_empty() => remaining = rest,
                _ => break,
            }
        }

        for item in items {
            self.item.parse(&builder.list_item_builder(), &item, at)?;
        }
        Ok(())
    }

    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        let sep = self.separator_regex();
        let item = self.item.to_regex(ctx);
        format!("(?:{item})(?:{sep}(?:{item}))*", item = item, sep = sep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormulaItem;
    use crate::value::Value;
    use num_bigint::BigInt;

    fn parse_list(ty: &Type, text: &str) -> Result<Value> {
        let root = Builder::new_root();
        let field = root.field_builder("seq");
        ty.parse(&field, text, Pos::none())?;
        Ok(field.get_simple().unwrap())
    }

    #[test]
    fn whitespace_delimited_items_in_order() {
        let ty = Type::sequence(Type::string_with_regex("[a-z0-9]+"), None);
        let tree = parse_list(&ty, "alpha beta gamma").unwrap();
        let items: Vec<_> = tree
            .as_list()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(items, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn custom_separator() {
        let ty = Type::sequence(Type::string_with_regex("[a-z]+"), Some(",".to_string()));
        let tree = parse_list(&ty, "a,b,c").unwrap();
        assert_eq!(tree.as_list().unwrap().len(), 3);
    }

    #[test]
    fn single_item_sequence() {
        let ty = Type::sequence(Type::string_with_regex("[a-z]+"), None);
        let tree = parse_list(&ty, "only").unwrap();
        assert_eq!(tree.as_list().unwrap().len(), 1);
    }

    #[test]
    fn composite_items_parse_into_maps() {
        let address = Type::formula(vec![
            FormulaItem::variable("host", Type::string_with_regex("[a-z0-9]+")),
            FormulaItem::literal(Type::constant(":")),
            FormulaItem::variable(
                "port",
                Type::int(Some(BigInt::from(0)), Some(BigInt::from(65535))),
            ),
        ]);
        let ty = Type::sequence(address, None);

        let tree = parse_list(&ty, "node1:9042 node2:9042 node3:9042").unwrap();
        let items = tree.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_map().unwrap()["host"].as_str(), Some("node2"));
        assert_eq!(items[2].as_map().unwrap()["port"], Value::Int(9042));
    }

    #[test]
    fn garbage_is_rejected() {
        let ty = Type::sequence(Type::string_with_regex("[a-z]+"), None);
        assert_eq!(
            parse_list(&ty, "abc 123").unwrap_err().kind,
            ParseErrorKind::NoMatch
        );
    }
}
