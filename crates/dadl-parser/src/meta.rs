//! The hand-wired meta-schema: the schema of DADL schema files.
//!
//! A schema file declares `[types]` and `[structure]`, each a map from
//! identifier to a type expression. A type expression is a oneof over the
//! definition forms; `mapDef` and `structDef` carry indented children that
//! are again type expressions, so the meta-schema's own type graph is cyclic
//! and is wired through the same delegated indirection the resolver uses.

use crate::schema::Schema;
use crate::types::{FormulaItem, OneofOption, Type, IDENTIFIER_PATTERN};
use indexmap::IndexMap;

fn lit(text: &str) -> FormulaItem {
    FormulaItem::literal(Type::constant(text))
}

fn pat(pattern: &str) -> FormulaItem {
    FormulaItem::literal(Type::string_with_regex(pattern))
}

fn var(name: &str, ty: Type) -> FormulaItem {
    FormulaItem::variable(name, ty)
}

fn opt(items: Vec<FormulaItem>) -> FormulaItem {
    FormulaItem::group(items)
}

/// A type-name reference; `...name` marks a spread in complex definitions.
fn type_name() -> Type {
    Type::string_with_regex(&format!("(?:\\.\\.\\.)?{}", IDENTIFIER_PATTERN))
}

/// Schema describing DADL schema files themselves.
pub fn meta_schema() -> Schema {
    // type expressions nest under mapDef/structDef children
    let expr_placeholder = Type::delegated();
    let expr_map = Type::map(Type::identifier(), expr_placeholder.clone());

    let string_def = Type::formula(vec![
        lit("string"),
        opt(vec![pat("\\s+"), var("regex", Type::string_with_regex("`[^`]*`"))]),
    ]);

    let identifier_def = Type::formula(vec![lit("identifier")]);

    let int_def = Type::formula(vec![
        lit("int"),
        opt(vec![
            pat("\\s+"),
            var("min", Type::string_with_regex("-?\\d+")),
            lit(".."),
            var("max", Type::string_with_regex("-?\\d+")),
        ]),
    ]);

    let number_def = Type::formula(vec![lit("number")]);
    let bool_def = Type::formula(vec![lit("bool")]);

    let enum_def = Type::formula(vec![
        lit("enum"),
        opt(vec![
            pat("\\s+"),
            lit("["),
            var("valueType", Type::identifier()),
            lit("]"),
        ]),
        pat("\\s+"),
        var("values", Type::string()),
    ]);

    let formula_def = Type::formula(vec![
        lit("formula"),
        pat("\\s+"),
        var("items", Type::string()),
    ]);

    let sequence_def = Type::formula(vec![
        lit("sequence"),
        opt(vec![pat("\\s+"), var("itemType", Type::identifier())]),
        opt(vec![
            pat("\\s+"),
            var("separator", Type::string_with_regex("'[^']*'")),
        ]),
    ]);

    let list_def = Type::formula(vec![
        lit("list"),
        opt(vec![pat("\\s+"), var("itemType", Type::identifier())]),
    ]);

    let map_def = Type::complex(
        Type::formula(vec![
            lit("map"),
            opt(vec![pat("\\s+"), var("keyType", Type::identifier())]),
            opt(vec![pat("\\s+"), var("valueType", Type::identifier())]),
        ]),
        "",
        expr_map.clone(),
        "children",
    );

    let oneof_def = Type::formula(vec![
        lit("oneof"),
        pat("\\s+"),
        var("options", Type::string()),
    ]);

    let complex_def = Type::formula(vec![
        lit("complex"),
        pat("\\s+"),
        var("textType", type_name()),
        pat("\\s+"),
        var("childType", type_name()),
    ]);

    // a bare key opens a struct; the `struct` keyword is optional
    let struct_def = Type::complex(
        Type::formula(vec![opt(vec![lit("struct")])]),
        "",
        expr_map.clone(),
        "children",
    );

    let custom_type_ref = Type::formula(vec![var("typeName", Type::identifier())]);

    // keyword forms first; the bare-key struct form and the free reference
    // would otherwise shadow them
    let type_expr = Type::oneof(
        None,
        vec![
            OneofOption::new("stringDef", string_def),
            OneofOption::new("identifierDef", identifier_def),
            OneofOption::new("intDef", int_def),
            OneofOption::new("numberDef", number_def),
            OneofOption::new("boolDef", bool_def),
            OneofOption::new("enumDef", enum_def),
            OneofOption::new("formulaDef", formula_def),
            OneofOption::new("sequenceDef", sequence_def),
            OneofOption::new("listDef", list_def),
            OneofOption::new("mapDef", map_def),
            OneofOption::new("oneofDef", oneof_def),
            OneofOption::new("complexDef", complex_def),
            OneofOption::new("structDef", struct_def),
            OneofOption::new("customTypeRef", custom_type_ref),
        ],
    );
    expr_placeholder.patch_delegated(type_expr);

    let mut root = IndexMap::new();
    root.insert("types".to_string(), expr_map.clone());
    root.insert("structure".to_string(), expr_map);
    Schema::new(Type::structure(root))
}
