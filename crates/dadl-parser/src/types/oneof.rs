//! Oneof value type: ordered alternatives discriminated by full-line match.

use std::cell::RefCell;
use std::rc::Rc;

use regex::Regex;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::types::{NodeInfo, RegexCtx, Type};
use crate::value::Value;

/// Builder-meta key recording the index of the option the last `parse`
/// matched; `parse_child` consults it to route indented children.
const LAST_MATCH: &str = "lastMatch";

/// Default field recording which option matched.
const DEFAULT_TYPE_KEY: &str = "@type";

/// Default field wrapping a simple option's value.
const DEFAULT_VALUE_KEY: &str = "value";

#[derive(Debug, Clone)]
pub struct OneofOption {
    pub name: String,
    pub ty: Type,
    /// Field the option's value is parsed into. Defaults to `value` for
    /// simple-valued options and to the node itself otherwise.
    pub value_key: Option<String>,
}

impl OneofOption {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            value_key: None,
        }
    }

    pub fn with_value_key(name: impl Into<String>, ty: Type, value_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            value_key: Some(value_key.into()),
        }
    }
}

#[derive(Debug)]
pub struct OneofType {
    type_key: Option<String>,
    options: Vec<OneofOption>,
    res: RefCell<Option<Rc<Vec<Regex>>>>,
}

impl OneofType {
    pub fn new(type_key: Option<String>, options: Vec<OneofOption>) -> Self {
        Self {
            type_key,
            options,
            res: RefCell::new(None),
        }
    }

    fn compiled(&self, at: Pos) -> Result<Rc<Vec<Regex>>> {
        if let Some(res) = self.res.borrow().as_ref() {
            return Ok(Rc::clone(res));
        }
        let mut res = Vec::with_capacity(self.options.len());
        for option in &self.options {
            let pattern = format!("^{}$", option.ty.to_regex(&RegexCtx::new()));
            res.push(Regex::new(&pattern).map_err(|e| {
                ParseError::new(
                    ParseErrorKind::InvalidSchemaFormat,
                    at,
                    format!("invalid pattern for option {}: {}", option.name, e),
                )
            })?);
        }
        let res = Rc::new(res);
        *self.res.borrow_mut() = Some(Rc::clone(&res));
        Ok(res)
    }

    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        let res = self.compiled(at)?;
        let text = text.trim();

        builder.clear_meta(LAST_MATCH);
        for (idx, re) in res.iter().enumerate() {
            if !re.is_match(text) {
                continue;
            }
            let option = &self.options[idx];
            tracing::trace!(option = %option.name, "oneof matched");

            let type_key = self.type_key.as_deref().unwrap_or(DEFAULT_TYPE_KEY);
            builder
                .field_builder(type_key)
                .set_simple(Value::String(option.name.clone()));

            let value_builder = match &option.value_key {
                Some(key) => builder.field_builder(key),
                None if option.ty.is_simple() => builder.field_builder(DEFAULT_VALUE_KEY),
                None => builder.clone(),
            };
            option.ty.parse(&value_builder, text, at)?;
            builder.set_meta(LAST_MATCH, idx);
            return Ok(());
        }
        Err(ParseError::new(
            ParseErrorKind::NoMatch,
            at,
            format!("no match for: {}", text),
        ))
    }

    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        let Some(idx) = builder.get_meta(LAST_MATCH) else {
            return Err(ParseError::new(
                ParseErrorKind::NotSupported,
                at,
                "no matched option to route children to",
            ));
        };
        let option = &self.options[idx];
        let value_builder = match &option.value_key {
            Some(key) => builder.field_builder(key),
            None => builder.clone(),
        };
        option.ty.parse_child(&value_builder, line, at)
    }

    pub fn supports_children(&self) -> bool {
        self.options.iter().any(|o| o.ty.supports_children())
    }

    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        let alternatives: Vec<String> = self
            .options
            .iter()
            .map(|o| format!("(?:{})", o.ty.to_regex(ctx)))
            .collect();
        alternatives.join("|")
    }
}
