//! Structural value types: list, map, struct.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::types::{NodeInfo, RegexCtx, Type, TypeKind};

/// List: empty on its own line; every indented child line parses as one item.
#[derive(Debug)]
pub struct ListType {
    item: Type,
}

impl ListType {
    pub fn new(item: Type) -> Self {
        Self { item }
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        let item_builder = builder.list_item_builder();
        self.item.parse(&item_builder, line, at)?;
        Ok(NodeInfo::new(self.item.clone(), item_builder))
    }
}

/// Map: each child line is `key value…`; the key becomes a field, the rest
/// of the line feeds the value type.
#[derive(Debug)]
pub struct MapType {
    key: Type,
    value: Type,
}

impl MapType {
    pub fn new(key: Type, value: Type) -> Self {
        Self { key, value }
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        let line = line.trim();
        let (key, rest) = match line.split_once(' ') {
            Some((key, rest)) => (key, rest),
            None => (line, ""),
        };

        let entry_builder = builder.field_builder(key);
        let struct_valued = matches!(self.value.resolved().kind(), TypeKind::Struct(_));
        if !rest.is_empty() && struct_valued {
            // an inline remainder on a struct value is its first child line,
            // merged with whatever indented children follow
            self.value.parse_child(&entry_builder, rest, at)?;
        } else {
            self.value.parse(&entry_builder, rest, at)?;
        }
        Ok(NodeInfo::new(self.value.clone(), entry_builder))
    }

    pub fn get_child(&self, name: &str, builder: &Builder) -> (Type, Builder) {
        (self.value.clone(), builder.field_builder(name))
    }

    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        self.key.to_regex(ctx)
    }
}

/// Key of a struct child line: an identifier, or a single-quoted string for
/// keys the identifier grammar rejects.
static STRUCT_CHILD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^(?P<key>(?:[A-Za-z0-9_-]+)|(?:'.*'))(?:\\s+(?P<rest>.*))?$").unwrap()
});

/// Struct: a fixed set of named children; unknown keys are rejected.
#[derive(Debug)]
pub struct StructType {
    children: IndexMap<String, Type>,
}

impl StructType {
    pub fn new(children: IndexMap<String, Type>) -> Self {
        Self { children }
    }

    pub fn parse(&self, text: &str, at: Pos) -> Result<()> {
        if !text.trim().is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidValue,
                at,
                format!("unexpected value: {}", text),
            ));
        }
        Ok(())
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        let caps = STRUCT_CHILD_RE.captures(line.trim()).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::NoMatch,
                at,
                format!("invalid child assignment: {}", line.trim()),
            )
        })?;
        let key = unquote(caps.name("key").map(|m| m.as_str()).unwrap_or(""));
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("");

        match self.children.get(key) {
            Some(child) => {
                let child_builder = builder.field_builder(key);
                child.parse(&child_builder, rest, at)?;
                Ok(NodeInfo::new(child.clone(), child_builder))
            }
            None => Err(ParseError::new(
                ParseErrorKind::UnexpectedChild,
                at,
                format!("child not expected: {}", key),
            )),
        }
    }

    pub fn get_child(&self, name: &str, builder: &Builder, at: Pos) -> Result<(Type, Builder)> {
        match self.children.get(name) {
            Some(child) => Ok((child.clone(), builder.field_builder(name))),
            None => Err(ParseError::new(
                ParseErrorKind::UnexpectedChild,
                at,
                format!("child not found: {}", name),
            )),
        }
    }
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample_struct() -> Type {
        let mut children = IndexMap::new();
        children.insert("intValue".to_string(), Type::int(None, None));
        children.insert("textValue".to_string(), Type::string());
        children.insert("weird key".to_string(), Type::string());
        Type::structure(children)
    }

    #[test]
    fn struct_rejects_inline_values() {
        let err = sample_struct()
            .parse(&Builder::new_root(), "stray", Pos::none())
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);
    }

    #[test]
    fn struct_dispatches_children_by_key() {
        let ty = sample_struct();
        let root = Builder::new_root();
        let node = root.field_builder("s");
        ty.parse_child(&node, "intValue 7", Pos::none()).unwrap();
        ty.parse_child(&node, "textValue some text", Pos::none())
            .unwrap();

        let map_value = node.get_simple().unwrap();
        let map = map_value.as_map().unwrap();
        assert_eq!(map["intValue"], Value::BigInt(7.into()));
        assert_eq!(map["textValue"].as_str(), Some("some text"));
    }

    #[test]
    fn quoted_keys_escape_the_identifier_grammar() {
        let ty = sample_struct();
        let root = Builder::new_root();
        let node = root.field_builder("s");
        ty.parse_child(&node, "'weird key' hello", Pos::none())
            .unwrap();
        let map_value = node.get_simple().unwrap();
        assert_eq!(
            map_value.as_map().unwrap()["weird key"].as_str(),
            Some("hello")
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let ty = sample_struct();
        let err = ty
            .parse_child(&Builder::new_root(), "mystery 1", Pos::none())
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChild);
    }

    #[test]
    fn map_splits_key_and_inline_value() {
        let ty = Type::map(Type::identifier(), Type::string());
        let root = Builder::new_root();
        let node = root.field_builder("m");
        ty.parse_child(&node, "firstKey some value", Pos::none())
            .unwrap();
        ty.parse_child(&node, "secondKey other", Pos::none()).unwrap();

        let map_value = node.get_simple().unwrap();
        let map = map_value.as_map().unwrap();
        assert_eq!(map["firstKey"].as_str(), Some("some value"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["firstKey", "secondKey"]);
    }

    #[test]
    fn map_routes_inline_rest_into_structured_values() {
        let ty = Type::map(Type::identifier(), sample_struct());
        let root = Builder::new_root();
        let node = root.field_builder("m");
        let info = ty
            .parse_child(&node, "firstKey intValue 7", Pos::none())
            .unwrap();
        // indented lines continue the same entry
        info.ty
            .parse_child(&info.builder, "textValue more", Pos::none())
            .unwrap();

        let map_value = node.get_simple().unwrap();
        let entry = map_value.as_map().unwrap()["firstKey"].as_map().unwrap().clone();
        assert_eq!(entry["intValue"], Value::BigInt(7.into()));
        assert_eq!(entry["textValue"].as_str(), Some("more"));
    }

    #[test]
    fn list_children_append_in_order() {
        let ty = Type::list(Type::string());
        let root = Builder::new_root();
        let node = root.field_builder("l");
        ty.parse(&node, "", Pos::none()).unwrap();
        ty.parse_child(&node, "first", Pos::none()).unwrap();
        ty.parse_child(&node, "second", Pos::none()).unwrap();

        let list_value = node.get_simple().unwrap();
        let items: Vec<_> = list_value
            .as_list()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        assert_eq!(items, vec!["first", "second"]);
    }
}
