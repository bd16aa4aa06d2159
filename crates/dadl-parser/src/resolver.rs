//! Turns a decoded schema AST into live value types.
//!
//! Named types may reference one another in cycles. Before a named type is
//! built, a delegated placeholder is registered under its name; references
//! encountered during construction resolve to that placeholder, and the
//! placeholder is patched to the concrete type once it exists.

use indexmap::IndexMap;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::schema::Schema;
use crate::schema_ast::{FormulaItemDef, SchemaAst, TypeDef};
use crate::types::{FormulaItem, OneofOption, Type};

/// Build a full schema from a decoded schema file: every named type, then
/// the root structure.
pub fn build_schema(ast: &SchemaAst) -> Result<Schema> {
    let mut resolver = TypeResolver::new(&ast.types);
    for name in ast.types.keys() {
        resolver.resolve(name)?;
    }
    let root = resolver.build_struct(&ast.structure)?;
    Ok(Schema::new(root))
}

pub struct TypeResolver<'a> {
    defs: &'a IndexMap<String, TypeDef>,
    resolved: IndexMap<String, Type>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(defs: &'a IndexMap<String, TypeDef>) -> Self {
        Self {
            defs,
            resolved: IndexMap::new(),
        }
    }

    /// Resolve a named type, building it on first use.
    pub fn resolve(&mut self, name: &str) -> Result<Type> {
        if let Some(ty) = self.resolved.get(name) {
            return Ok(ty.clone());
        }
        let def = self.defs.get(name).ok_or_else(|| {
            ParseError::unpositioned(
                ParseErrorKind::UnknownType,
                format!("unknown type, no definition for: {}", name),
            )
        })?;

        let placeholder = Type::delegated();
        self.resolved.insert(name.to_string(), placeholder.clone());

        let built = self.build(def)?;
        placeholder.patch_delegated(built.clone());
        self.resolved.insert(name.to_string(), built.clone());
        Ok(built)
    }

    /// A type named in a definition: one of the built-in kinds, or a
    /// reference into the `[types]` table.
    fn resolve_name(&mut self, name: &str) -> Result<Type> {
        match name {
            "string" => Ok(Type::string()),
            "identifier" => Ok(Type::identifier()),
            "int" => Ok(Type::int(None, None)),
            "number" => Ok(Type::number()),
            "bool" => Ok(Type::bool()),
            _ => self.resolve(name),
        }
    }

    fn resolve_name_or(&mut self, name: &Option<String>, default: fn() -> Type) -> Result<Type> {
        match name {
            Some(name) => self.resolve_name(name),
            None => Ok(default()),
        }
    }

    /// Build a live type from one definition form.
    pub fn build(&mut self, def: &TypeDef) -> Result<Type> {
        match def {
            TypeDef::Str { regex } => Ok(match regex {
                Some(pattern) => Type::string_with_regex(pattern),
                None => Type::string(),
            }),
            TypeDef::Identifier => Ok(Type::identifier()),
            TypeDef::Int { min, max } => Ok(Type::int(min.clone(), max.clone())),
            TypeDef::Number => Ok(Type::number()),
            TypeDef::Bool => Ok(Type::bool()),
            TypeDef::Enum { value_type, values } => {
                let value_type = self.resolve_name_or(value_type, Type::string)?;
                let mut table = IndexMap::new();
                for value in values {
                    let mapped = value.mapped.clone().unwrap_or_else(|| value.text.clone());
                    table.insert(value.text.clone(), mapped);
                }
                Ok(Type::enumeration(value_type, table))
            }
            TypeDef::Formula { items } => {
                let items = items
                    .iter()
                    .map(|item| self.build_formula_item(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Type::formula(items))
            }
            TypeDef::Sequence {
                item_type,
                separator,
            } => {
                let item = self.resolve_name_or(item_type, Type::string)?;
                Ok(Type::sequence(item, separator.clone()))
            }
            TypeDef::List { item_type } => {
                let item = self.resolve_name_or(item_type, Type::string)?;
                Ok(Type::list(item))
            }
            TypeDef::Map {
                key_type,
                value_type,
                children,
            } => {
                let key = self.resolve_name_or(key_type, Type::identifier)?;
                let value = match (value_type, children) {
                    (Some(name), _) => self.resolve_name(name)?,
                    (None, Some(children)) => self.build_struct(children)?,
                    (None, None) => Type::string(),
                };
                Ok(Type::map(key, value))
            }
            TypeDef::Struct { children } => self.build_struct(children),
            TypeDef::Oneof { options } => {
                let options = options
                    .iter()
                    .map(|name| Ok(OneofOption::new(name.clone(), self.resolve(name)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Type::oneof(None, options))
            }
            TypeDef::Complex {
                text_type,
                spread_text,
                child_type,
                spread_children,
            } => {
                let text = self.resolve_name(text_type)?;
                let structure = self.resolve_name(child_type)?;
                let text_key = if *spread_text { "" } else { "value" };
                let struct_key = if *spread_children { "" } else { "children" };
                Ok(Type::complex(text, text_key, structure, struct_key))
            }
            TypeDef::Ref { type_name } => self.resolve_name(type_name),
        }
    }

    pub fn build_struct(&mut self, children: &IndexMap<String, TypeDef>) -> Result<Type> {
        let mut built = IndexMap::new();
        for (name, def) in children {
            built.insert(name.clone(), self.build(def)?);
        }
        Ok(Type::structure(built))
    }

    fn build_formula_item(&mut self, item: &FormulaItemDef) -> Result<FormulaItem> {
        match item {
            FormulaItemDef::Constant(text) => Ok(FormulaItem::literal(Type::constant(text.clone()))),
            FormulaItemDef::Pattern(pattern) => {
                Ok(FormulaItem::literal(Type::string_with_regex(pattern)))
            }
            FormulaItemDef::Variable {
                name,
                type_name,
                as_struct,
            } => {
                let ty = self.resolve_name(type_name)?;
                Ok(if *as_struct {
                    FormulaItem::struct_variable(name.clone(), ty)
                } else {
                    FormulaItem::variable(name.clone(), ty)
                })
            }
            FormulaItemDef::Optional(children) => {
                let children = children
                    .iter()
                    .map(|child| self.build_formula_item(child))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FormulaItem::group(children))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::error::Pos;
    use crate::types::RegexCtx;
    use crate::value::Value;

    fn defs(entries: Vec<(&str, TypeDef)>) -> IndexMap<String, TypeDef> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn mutually_recursive_types_resolve_to_one_graph() {
        let table = defs(vec![
            (
                "node",
                TypeDef::Formula {
                    items: vec![
                        FormulaItemDef::Variable {
                            name: "name".into(),
                            type_name: "identifier".into(),
                            as_struct: false,
                        },
                        FormulaItemDef::Optional(vec![
                            FormulaItemDef::Constant("->".into()),
                            FormulaItemDef::Variable {
                                name: "next".into(),
                                type_name: "node".into(),
                                as_struct: false,
                            },
                        ]),
                    ],
                },
            ),
        ]);
        let mut resolver = TypeResolver::new(&table);
        let ty = resolver.resolve("node").unwrap();

        // cycle terminates in regex generation
        let pattern = ty.to_regex(&RegexCtx::new());
        regex::Regex::new(&format!("^{}$", pattern)).unwrap();

        // and parses a self-referential value
        let root = Builder::new_root();
        let node = root.field_builder("n");
        ty.parse(&node, "a->b", Pos::none()).unwrap();
        let tree = node.get_simple().unwrap();
        let map = tree.as_map().unwrap();
        assert_eq!(map["name"].as_str(), Some("a"));
        assert_eq!(map["next"].as_map().unwrap()["name"].as_str(), Some("b"));
    }

    #[test]
    fn unknown_reference_is_reported() {
        let table = defs(vec![(
            "broken",
            TypeDef::Sequence {
                item_type: Some("missing".into()),
                separator: None,
            },
        )]);
        let mut resolver = TypeResolver::new(&table);
        let err = resolver.resolve("broken").unwrap_err();
        assert_eq!(err.kind, crate::error::ParseErrorKind::UnknownType);
    }

    #[test]
    fn resolving_twice_reuses_the_instance() {
        let table = defs(vec![("port", TypeDef::Int {
            min: None,
            max: None,
        })]);
        let mut resolver = TypeResolver::new(&table);
        let first = resolver.resolve("port").unwrap();
        let second = resolver.resolve("port").unwrap();

        let root = Builder::new_root();
        let field = root.field_builder("p");
        first.parse(&field, "7", Pos::none()).unwrap();
        second.parse(&field, "7", Pos::none()).unwrap();
        assert_eq!(field.get_simple(), Some(Value::BigInt(7.into())));
    }
}
