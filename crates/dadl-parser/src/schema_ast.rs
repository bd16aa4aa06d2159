//! Schema AST: the intermediate form a parsed schema file decodes into
//! before the resolver turns it into live value types.
//!
//! The meta-schema tags every type expression with its definition form under
//! `@type`; decoding dispatches on that tag. Formula item lists and oneof
//! option lists arrive as raw text (nested optional groups are not regular,
//! so the meta-schema cannot capture them item by item) and are tokenized
//! here by a small hand-written scanner.

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::value::Value;

/// One type definition form, mirroring the meta-schema's alternatives.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Str {
        regex: Option<String>,
    },
    Identifier,
    Int {
        min: Option<BigInt>,
        max: Option<BigInt>,
    },
    Number,
    Bool,
    Enum {
        value_type: Option<String>,
        values: Vec<EnumValueDef>,
    },
    Formula {
        items: Vec<FormulaItemDef>,
    },
    Sequence {
        item_type: Option<String>,
        separator: Option<String>,
    },
    List {
        item_type: Option<String>,
    },
    Map {
        key_type: Option<String>,
        value_type: Option<String>,
        children: Option<IndexMap<String, TypeDef>>,
    },
    Struct {
        children: IndexMap<String, TypeDef>,
    },
    Oneof {
        options: Vec<String>,
    },
    Complex {
        text_type: String,
        spread_text: bool,
        child_type: String,
        spread_children: bool,
    },
    Ref {
        type_name: String,
    },
}

/// One enumerated text, optionally mapped to a different stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDef {
    pub text: String,
    pub mapped: Option<String>,
}

/// One element of a formula template definition.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaItemDef {
    /// `'literal text'`
    Constant(String),
    /// `` `raw regex` ``
    Pattern(String),
    /// `<name type>` / `<+name type>`
    Variable {
        name: String,
        type_name: String,
        as_struct: bool,
    },
    /// `[ items… ]`
    Optional(Vec<FormulaItemDef>),
}

/// Decoded schema file: named types plus the document root structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaAst {
    pub types: IndexMap<String, TypeDef>,
    pub structure: IndexMap<String, TypeDef>,
}

/// Decode the tree a schema file parses to (under the meta-schema).
pub fn decode(tree: &Value) -> Result<SchemaAst> {
    let root = tree
        .as_map()
        .ok_or_else(|| invalid("schema file did not produce a map"))?;

    let mut ast = SchemaAst::default();
    if let Some(types) = root.get("types") {
        ast.types = decode_section(types, "types")?;
    }
    if let Some(structure) = root.get("structure") {
        ast.structure = decode_section(structure, "structure")?;
    }
    Ok(ast)
}

fn decode_section(section: &Value, name: &str) -> Result<IndexMap<String, TypeDef>> {
    let entries = section
        .as_map()
        .ok_or_else(|| invalid(format!("[{}] is not a map", name)))?;
    let mut defs = IndexMap::new();
    for (key, value) in entries {
        defs.insert(key.clone(), decode_type_def(value)?);
    }
    Ok(defs)
}

fn decode_type_def(value: &Value) -> Result<TypeDef> {
    let fields = value
        .as_map()
        .ok_or_else(|| invalid("type definition is not a map"))?;
    let tag = fields
        .get("@type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("type definition has no form tag"))?;

    match tag {
        "stringDef" => Ok(TypeDef::Str {
            regex: opt_text(fields, "regex").map(strip_delimiters),
        }),
        "identifierDef" => Ok(TypeDef::Identifier),
        "intDef" => Ok(TypeDef::Int {
            min: opt_text(fields, "min").map(parse_bound).transpose()?,
            max: opt_text(fields, "max").map(parse_bound).transpose()?,
        }),
        "numberDef" => Ok(TypeDef::Number),
        "boolDef" => Ok(TypeDef::Bool),
        "enumDef" => Ok(TypeDef::Enum {
            value_type: opt_text(fields, "valueType"),
            values: decode_enum_values(&require_text(fields, "values")?)?,
        }),
        "formulaDef" => Ok(TypeDef::Formula {
            items: scan_formula_items(&require_text(fields, "items")?)?,
        }),
        "sequenceDef" => Ok(TypeDef::Sequence {
            item_type: opt_text(fields, "itemType"),
            separator: opt_text(fields, "separator").map(strip_delimiters),
        }),
        "listDef" => Ok(TypeDef::List {
            item_type: opt_text(fields, "itemType"),
        }),
        "mapDef" => Ok(TypeDef::Map {
            key_type: opt_text(fields, "keyType"),
            value_type: opt_text(fields, "valueType"),
            children: decode_children(fields)?,
        }),
        "structDef" => Ok(TypeDef::Struct {
            children: decode_children(fields)?.unwrap_or_default(),
        }),
        "oneofDef" => {
            let raw = require_text(fields, "options")?;
            let options: Vec<String> = raw
                .split('|')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if options.is_empty() {
                return Err(invalid("oneof with no options"));
            }
            Ok(TypeDef::Oneof { options })
        }
        "complexDef" => {
            let (text_type, spread_text) = split_spread(&require_text(fields, "textType")?);
            let (child_type, spread_children) = split_spread(&require_text(fields, "childType")?);
            Ok(TypeDef::Complex {
                text_type,
                spread_text,
                child_type,
                spread_children,
            })
        }
        "customTypeRef" => Ok(TypeDef::Ref {
            type_name: require_text(fields, "typeName")?,
        }),
        other => Err(invalid(format!("unknown type definition form: {}", other))),
    }
}

fn decode_children(
    fields: &IndexMap<String, Value>,
) -> Result<Option<IndexMap<String, TypeDef>>> {
    match fields.get("children") {
        Some(children) => Ok(Some(decode_section(children, "children")?)),
        None => Ok(None),
    }
}

fn decode_enum_values(raw: &str) -> Result<Vec<EnumValueDef>> {
    let mut values = Vec::new();
    for token in raw.split_whitespace() {
        let (text, mapped) = match token.split_once(':') {
            Some((text, mapped)) => (text, Some(mapped.to_string())),
            None => (token, None),
        };
        if text.is_empty() {
            return Err(invalid(format!("invalid enum value: {}", token)));
        }
        values.push(EnumValueDef {
            text: text.to_string(),
            mapped,
        });
    }
    if values.is_empty() {
        return Err(invalid("enum with no values"));
    }
    Ok(values)
}

fn parse_bound(text: String) -> Result<BigInt> {
    text.parse()
        .map_err(|_| invalid(format!("invalid int bound: {}", text)))
}

/// Drop the surrounding pair of delimiter characters the meta-schema
/// captured along with the payload (backticks around regexes, quotes around
/// separators).
fn strip_delimiters(text: String) -> String {
    if text.len() >= 2 {
        text[1..text.len() - 1].to_string()
    } else {
        text
    }
}

fn split_spread(name: &str) -> (String, bool) {
    match name.strip_prefix("...") {
        Some(rest) => (rest.to_string(), true),
        None => (name.to_string(), false),
    }
}

fn opt_text(fields: &IndexMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn require_text(fields: &IndexMap<String, Value>, key: &str) -> Result<String> {
    opt_text(fields, key).ok_or_else(|| invalid(format!("missing '{}' in type definition", key)))
}

fn invalid(message: impl Into<String>) -> ParseError {
    ParseError::unpositioned(ParseErrorKind::InvalidSchemaFormat, message)
}

// -- formula item scanner --------------------------------------------------

/// Tokenize a formula item list: `'…'`, `` `…` ``, `<name type>`,
/// `<+name type>`, `[items…]`. Whitespace between items separates them and
/// is not part of the match; literal spacing belongs in quoted constants or
/// regex fragments.
pub fn scan_formula_items(input: &str) -> Result<Vec<FormulaItemDef>> {
    let mut chars: Vec<char> = input.chars().collect();
    // sentinel simplifies bounds handling
    chars.push('\0');
    let mut pos = 0;
    let items = scan_items(&chars, &mut pos, false)?;
    if chars[pos] != '\0' {
        return Err(invalid(format!(
            "unexpected '{}' in formula definition",
            chars[pos]
        )));
    }
    if items.is_empty() {
        return Err(invalid("formula with no items"));
    }
    Ok(items)
}

fn scan_items(chars: &[char], pos: &mut usize, in_group: bool) -> Result<Vec<FormulaItemDef>> {
    let mut items = Vec::new();
    loop {
        while chars[*pos].is_whitespace() && chars[*pos] != '\0' {
            *pos += 1;
        }
        match chars[*pos] {
            '\0' => return Ok(items),
            ']' if in_group => return Ok(items),
            '\'' => items.push(scan_delimited(chars, pos, '\'', FormulaItemDef::Constant)?),
            '`' => items.push(scan_delimited(chars, pos, '`', FormulaItemDef::Pattern)?),
            '<' => items.push(scan_variable(chars, pos)?),
            '[' => {
                *pos += 1;
                let children = scan_items(chars, pos, true)?;
                if chars[*pos] != ']' {
                    return Err(invalid("unterminated optional group in formula"));
                }
                *pos += 1;
                items.push(FormulaItemDef::Optional(children));
            }
            other => {
                return Err(invalid(format!(
                    "unexpected '{}' in formula definition",
                    other
                )))
            }
        }
    }
}

fn scan_delimited(
    chars: &[char],
    pos: &mut usize,
    close: char,
    wrap: fn(String) -> FormulaItemDef,
) -> Result<FormulaItemDef> {
    *pos += 1;
    let start = *pos;
    while chars[*pos] != close && chars[*pos] != '\0' {
        *pos += 1;
    }
    if chars[*pos] == '\0' {
        return Err(invalid("unterminated literal in formula"));
    }
    let text: String = chars[start..*pos].iter().collect();
    *pos += 1;
    Ok(wrap(text))
}

fn scan_variable(chars: &[char], pos: &mut usize) -> Result<FormulaItemDef> {
    *pos += 1;
    let as_struct = if chars[*pos] == '+' {
        *pos += 1;
        true
    } else {
        false
    };
    let start = *pos;
    while chars[*pos] != '>' && chars[*pos] != '\0' {
        *pos += 1;
    }
    if chars[*pos] == '\0' {
        return Err(invalid("unterminated variable in formula"));
    }
    let body: String = chars[start..*pos].iter().collect();
    *pos += 1;

    let mut parts = body.split_whitespace();
    let name = parts.next().unwrap_or("");
    let type_name = parts.next().unwrap_or("");
    if name.is_empty() || type_name.is_empty() || parts.next().is_some() {
        return Err(invalid(format!("invalid formula variable: <{}>", body)));
    }
    Ok(FormulaItemDef::Variable {
        name: name.to_string(),
        type_name: type_name.to_string(),
        as_struct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_constants_variables_and_patterns() {
        let items = scan_formula_items("<host hostname> ':' <port networkPort>").unwrap();
        assert_eq!(
            items,
            vec![
                FormulaItemDef::Variable {
                    name: "host".into(),
                    type_name: "hostname".into(),
                    as_struct: false,
                },
                FormulaItemDef::Constant(":".into()),
                FormulaItemDef::Variable {
                    name: "port".into(),
                    type_name: "networkPort".into(),
                    as_struct: false,
                },
            ]
        );
    }

    #[test]
    fn scans_nested_optional_groups() {
        let items = scan_formula_items("<name identifier> [`\\s+` ['#' <desc string>]]").unwrap();
        let FormulaItemDef::Optional(outer) = &items[1] else {
            panic!("expected optional group");
        };
        assert_eq!(outer[0], FormulaItemDef::Pattern("\\s+".into()));
        let FormulaItemDef::Optional(inner) = &outer[1] else {
            panic!("expected nested optional group");
        };
        assert_eq!(inner[0], FormulaItemDef::Constant("#".into()));
    }

    #[test]
    fn struct_marker_is_recognized() {
        let items = scan_formula_items("<+body block>").unwrap();
        assert_eq!(
            items[0],
            FormulaItemDef::Variable {
                name: "body".into(),
                type_name: "block".into(),
                as_struct: true,
            }
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(scan_formula_items("<unclosed").is_err());
        assert!(scan_formula_items("'unterminated").is_err());
        assert!(scan_formula_items("[<a b>").is_err());
        assert!(scan_formula_items("stray").is_err());
        assert!(scan_formula_items("<toomany parts here>").is_err());
    }

    #[test]
    fn enum_values_split_text_and_mapping() {
        let values = decode_enum_values("GET POST ok:200").unwrap();
        assert_eq!(values[0].text, "GET");
        assert_eq!(values[0].mapped, None);
        assert_eq!(values[2].text, "ok");
        assert_eq!(values[2].mapped.as_deref(), Some("200"));
    }
}
