//! Complex value type: an inline textual value combined with an indented
//! structural body.

use crate::builder::Builder;
use crate::error::{Pos, Result};
use crate::types::{NodeInfo, RegexCtx, Type};

/// Routes the line value through the text type at `text_key` and indented
/// lines through the struct type at `struct_key`. Either path may be empty,
/// which spreads that side directly into the node.
#[derive(Debug)]
pub struct ComplexType {
    text: Type,
    text_key: String,
    structure: Type,
    struct_key: String,
}

impl ComplexType {
    pub fn new(text: Type, text_key: String, structure: Type, struct_key: String) -> Self {
        Self {
            text,
            text_key,
            structure,
            struct_key,
        }
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        self.text
            .parse(&walk_field_path(builder, &self.text_key), text, at)
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        self.structure
            .parse_child(&walk_field_path(builder, &self.struct_key), line, at)
    }

    pub fn get_child(&self, name: &str, builder: &Builder, at: Pos) -> Result<(Type, Builder)> {
        self.structure.get_child(name, builder, at)
    }

    pub fn supports_children(&self) -> bool {
        self.structure.supports_children()
    }

    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        self.text.to_regex(ctx)
    }
}

/// Follow a dot-separated field path; the empty path is the node itself.
fn walk_field_path(builder: &Builder, path: &str) -> Builder {
    if path.is_empty() {
        return builder.clone();
    }
    let mut current = builder.clone();
    for part in path.split('.') {
        current = current.field_builder(part);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use crate::value::Value;

    fn node_struct() -> Type {
        let mut children = IndexMap::new();
        children.insert("weight".to_string(), Type::int(None, None));
        children.insert("label".to_string(), Type::string());
        Type::structure(children)
    }

    #[test]
    fn value_and_children_land_under_their_keys() {
        let ty = Type::complex(Type::string(), "value", node_struct(), "children");
        let root = Builder::new_root();
        let node = root.field_builder("n");

        ty.parse(&node, "inline address", Pos::none()).unwrap();
        ty.parse_child(&node, "weight 7", Pos::none()).unwrap();

        let tree = node.get_simple().unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["value"].as_str(), Some("inline address"));
        assert_eq!(
            map["children"].as_map().unwrap()["weight"],
            Value::BigInt(7.into())
        );
    }

    #[test]
    fn spread_paths_merge_into_the_node() {
        let ty = Type::complex(
            Type::formula(vec![crate::types::FormulaItem::variable(
                "addr",
                Type::identifier(),
            )]),
            "",
            node_struct(),
            "",
        );
        let root = Builder::new_root();
        let node = root.field_builder("n");

        ty.parse(&node, "node1", Pos::none()).unwrap();
        ty.parse_child(&node, "label primary", Pos::none()).unwrap();

        let tree = node.get_simple().unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["addr"].as_str(), Some("node1"));
        assert_eq!(map["label"].as_str(), Some("primary"));
    }

    #[test]
    fn dotted_paths_nest() {
        let ty = Type::complex(Type::string(), "meta.address", node_struct(), "body");
        let root = Builder::new_root();
        let node = root.field_builder("n");
        ty.parse(&node, "somewhere", Pos::none()).unwrap();

        let tree = node.get_simple().unwrap();
        let meta = tree.as_map().unwrap()["meta"].as_map().unwrap().clone();
        assert_eq!(meta["address"].as_str(), Some("somewhere"));
    }
}
