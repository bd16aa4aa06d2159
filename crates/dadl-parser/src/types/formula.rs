//! Formula value type: a single-line template composed from literals, raw
//! regex fragments, named sub-types, and optional groups.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::types::{NodeInfo, RegexCtx, Type};

/// One element of a formula template.
#[derive(Debug, Clone)]
pub enum FormulaItem {
    /// Positional literal or raw regex fragment; matched but never captured.
    Literal(Type),
    /// Captured item. The match is parsed by `ty` into the named field, or
    /// spread directly into the parent node when `name` is `None`.
    Variable {
        name: Option<String>,
        ty: Type,
        /// Marks the item whose type receives the formula's indented
        /// children (`<+name type>` in schema syntax).
        as_struct: bool,
    },
    /// Optional composite group; all-or-nothing at match time.
    Group(Vec<FormulaItem>),
}

impl FormulaItem {
    pub fn literal(ty: Type) -> Self {
        FormulaItem::Literal(ty)
    }

    pub fn variable(name: impl Into<String>, ty: Type) -> Self {
        FormulaItem::Variable {
            name: Some(name.into()),
            ty,
            as_struct: false,
        }
    }

    pub fn struct_variable(name: impl Into<String>, ty: Type) -> Self {
        FormulaItem::Variable {
            name: Some(name.into()),
            ty,
            as_struct: true,
        }
    }

    pub fn spread(ty: Type) -> Self {
        FormulaItem::Variable {
            name: None,
            ty,
            as_struct: false,
        }
    }

    pub fn group(items: Vec<FormulaItem>) -> Self {
        FormulaItem::Group(items)
    }
}

/// Compiled artefacts, built on first use: the anchored capturing regex, the
/// capture-index-to-item mapping (preorder, descending into groups), and the
/// type that receives indented children, if any item claims them.
#[derive(Debug)]
struct Compiled {
    re: Regex,
    mapping: Vec<(Option<String>, Type)>,
    struct_type: Option<Type>,
}

#[derive(Debug)]
pub struct FormulaType {
    items: Vec<FormulaItem>,
    compiled: RefCell<Option<Rc<Compiled>>>,
}

impl FormulaType {
    pub fn new(items: Vec<FormulaItem>) -> Self {
        Self {
            items,
            compiled: RefCell::new(None),
        }
    }

    fn compiled(&self, at: Pos) -> Result<Rc<Compiled>> {
        if let Some(compiled) = self.compiled.borrow().as_ref() {
            return Ok(Rc::clone(compiled));
        }

        let pattern = format!(
            "^{}$",
            items_regex(&self.items, true, &RegexCtx::new())
        );
        let re = Regex::new(&pattern).map_err(|e| {
            ParseError::new(
                ParseErrorKind::InvalidSchemaFormat,
                at,
                format!("invalid formula pattern: {}", e),
            )
        })?;

        let mut mapping = Vec::new();
        let mut struct_type = None;
        build_mapping(&self.items, &mut mapping, &mut struct_type);

        let compiled = Rc::new(Compiled {
            re,
            mapping,
            struct_type,
        });
        *self.compiled.borrow_mut() = Some(Rc::clone(&compiled));
        Ok(compiled)
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let compiled = self.compiled(at)?;
        let text = text.trim();
        let caps = compiled.re.captures(text).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::NoMatch,
                at,
                format!("no match for: {}", text),
            )
        })?;

        for (idx, (name, ty)) in compiled.mapping.iter().enumerate() {
            let Some(matched) = caps.get(idx + 1) else {
                // optional group skipped
                continue;
            };
            let target = match name {
                Some(field) => builder.field_builder(field),
                None => builder.clone(),
            };
            ty.parse(&target, matched.as_str(), at)?;
        }
        Ok(())
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        let compiled = self.compiled(at)?;
        match &compiled.struct_type {
            Some(ty) => ty.parse_child(builder, line, at),
            None => Err(ParseError::new(
                ParseErrorKind::NotSupported,
                at,
                "formula has no structural item; children not supported",
            )),
        }
    }

    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        items_regex(&self.items, false, ctx)
    }
}

fn items_regex(items: &[FormulaItem], capture: bool, ctx: &RegexCtx) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            FormulaItem::Literal(ty) => {
                out.push_str("(?:");
                out.push_str(&ty.to_regex(ctx));
                out.push(')');
            }
            FormulaItem::Variable { ty, .. } => {
                let (open, close) = if capture { ("(", ")") } else { ("(?:", ")") };
                out.push_str(open);
                out.push_str(&ty.to_regex(ctx));
                out.push_str(close);
            }
            FormulaItem::Group(children) => {
                out.push_str("(?:");
                out.push_str(&items_regex(children, capture, ctx));
                out.push_str(")?");
            }
        }
    }
    out
}

fn build_mapping(
    items: &[FormulaItem],
    mapping: &mut Vec<(Option<String>, Type)>,
    struct_type: &mut Option<Type>,
) {
    for item in items {
        match item {
            FormulaItem::Literal(_) => {}
            FormulaItem::Variable {
                name,
                ty,
                as_struct,
            } => {
                mapping.push((name.clone(), ty.clone()));
                if *as_struct {
                    *struct_type = Some(ty.clone());
                }
            }
            FormulaItem::Group(children) => build_mapping(children, mapping, struct_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use num_bigint::BigInt;

    /// `<host hostname> ':' <port int>`
    fn address() -> Type {
        Type::formula(vec![
            FormulaItem::variable("host", Type::string_with_regex("[a-z0-9]+")),
            FormulaItem::literal(Type::constant(":")),
            FormulaItem::variable(
                "port",
                Type::int(Some(BigInt::from(0)), Some(BigInt::from(65535))),
            ),
        ])
    }

    fn parse_into_map(ty: &Type, text: &str) -> Result<Value> {
        let root = Builder::new_root();
        let node = root.field_builder("node");
        ty.parse(&node, text, Pos::none())?;
        Ok(node.get_simple().unwrap())
    }

    #[test]
    fn named_items_populate_fields() {
        let tree = parse_into_map(&address(), "node1:9042").unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["host"].as_str(), Some("node1"));
        assert_eq!(map["port"], Value::Int(9042));
    }

    #[test]
    fn mismatch_reports_no_match() {
        let err = parse_into_map(&address(), "node1-9042").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NoMatch);
    }

    #[test]
    fn skipped_optional_group_leaves_fields_unset() {
        // <name ident> [ ' (' <alias ident> ')' ]
        let ty = Type::formula(vec![
            FormulaItem::variable("name", Type::identifier()),
            FormulaItem::group(vec![
                FormulaItem::literal(Type::constant(" (")),
                FormulaItem::variable("alias", Type::identifier()),
                FormulaItem::literal(Type::constant(")")),
            ]),
        ]);

        let with = parse_into_map(&ty, "primary (main)").unwrap();
        assert_eq!(with.as_map().unwrap()["alias"].as_str(), Some("main"));

        let without = parse_into_map(&ty, "primary").unwrap();
        assert_eq!(without.as_map().unwrap().get("alias"), None);
        assert_eq!(without.as_map().unwrap()["name"].as_str(), Some("primary"));
    }

    #[test]
    fn struct_item_receives_indented_children() {
        let mut children = indexmap::IndexMap::new();
        children.insert("weight".to_string(), Type::string());
        let attrs = Type::structure(children);

        // <name ident> <+attrs …>: children of the formula line route to the
        // marked item's type
        let ty = Type::formula(vec![
            FormulaItem::variable("name", Type::identifier()),
            FormulaItem::struct_variable("attrs", attrs),
        ]);

        let root = Builder::new_root();
        let node = root.field_builder("n");
        ty.parse(&node, "node1", Pos::none()).unwrap();
        ty.parse_child(&node, "weight heavy", Pos::none()).unwrap();

        let tree = node.get_simple().unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["name"].as_str(), Some("node1"));
        assert_eq!(map["weight"].as_str(), Some("heavy"));
    }

    #[test]
    fn children_without_struct_item_are_rejected() {
        let err = address()
            .parse_child(&Builder::new_root(), "child", Pos::none())
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NotSupported);
    }

    #[test]
    fn spread_items_write_into_the_parent() {
        let inner = Type::formula(vec![
            FormulaItem::variable("kind", Type::identifier()),
            FormulaItem::literal(Type::constant("/")),
            FormulaItem::variable("id", Type::identifier()),
        ]);
        let outer = Type::formula(vec![FormulaItem::spread(inner)]);

        let tree = parse_into_map(&outer, "user/42").unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["kind"].as_str(), Some("user"));
        assert_eq!(map["id"].as_str(), Some("42"));
    }
}
