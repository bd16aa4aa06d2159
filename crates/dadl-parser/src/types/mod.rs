//! The closed set of value types driving the parse.
//!
//! A [`Type`] is a cheap-clone handle over one node of the schema's type
//! tree. Every kind exposes the same operation suite (`parse` for a line
//! value, `parse_child` for an indented child line, `get_child` for dotted
//! path resolution, `to_regex` for composition into enclosing formulas) and
//! the driver dispatches through the handle without knowing the kind.
//!
//! Type graphs may be cyclic (`delegated` breaks construction cycles;
//! [`RegexCtx`] breaks regex-generation cycles), so handles are reference
//! counted and compared by identity where cycles matter.

mod collection;
mod complex;
mod enumeration;
mod formula;
mod numeric;
mod oneof;
mod sequence;
mod text;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};

pub use collection::{ListType, MapType, StructType};
pub use complex::ComplexType;
pub use enumeration::EnumType;
pub use formula::{FormulaItem, FormulaType};
pub use numeric::{BoolType, IntType, NumberType};
pub use oneof::{OneofOption, OneofType};
pub use sequence::SequenceType;
pub use text::{ConstantType, StrType, IDENTIFIER_PATTERN};

/// The kind behind a [`Type`] handle.
#[derive(Debug)]
pub enum TypeKind {
    Str(StrType),
    Constant(ConstantType),
    Int(IntType),
    Number(NumberType),
    Bool(BoolType),
    Enum(EnumType),
    Formula(FormulaType),
    Sequence(SequenceType),
    List(ListType),
    Map(MapType),
    Struct(StructType),
    Oneof(OneofType),
    Complex(ComplexType),
    /// Late-bound indirection installed by the resolver before a named type
    /// is constructed, so mutually recursive definitions resolve to the same
    /// handle.
    Delegated(RefCell<Option<Type>>),
}

/// Handle to a value type. Clones share the node (and its lazy caches).
#[derive(Debug, Clone)]
pub struct Type(Rc<TypeKind>);

/// A parsed node: the type that owns it and the builder positioned at its
/// output. Returned by `parse_child` to become the parent of the next
/// indentation level.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub ty: Type,
    pub builder: Builder,
}

impl NodeInfo {
    pub fn new(ty: Type, builder: Builder) -> Self {
        Self { ty, builder }
    }
}

impl Type {
    fn new(kind: TypeKind) -> Self {
        Self(Rc::new(kind))
    }

    pub(crate) fn kind(&self) -> &TypeKind {
        &self.0
    }

    /// Identity of this node for cycle detection.
    fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    // -- constructors ------------------------------------------------------

    pub fn string() -> Self {
        Self::new(TypeKind::Str(StrType::plain()))
    }

    pub fn string_with_regex(pattern: &str) -> Self {
        Self::new(TypeKind::Str(StrType::with_regex(pattern)))
    }

    pub fn identifier() -> Self {
        Self::string_with_regex(IDENTIFIER_PATTERN)
    }

    pub fn constant(literal: impl Into<String>) -> Self {
        Self::new(TypeKind::Constant(ConstantType::new(literal)))
    }

    pub fn int(min: Option<BigInt>, max: Option<BigInt>) -> Self {
        Self::new(TypeKind::Int(IntType::new(min, max)))
    }

    pub fn number() -> Self {
        Self::new(TypeKind::Number(NumberType))
    }

    pub fn bool() -> Self {
        Self::new(TypeKind::Bool(BoolType))
    }

    pub fn enumeration(value_type: Type, values: IndexMap<String, String>) -> Self {
        Self::new(TypeKind::Enum(EnumType::new(value_type, values)))
    }

    pub fn formula(items: Vec<FormulaItem>) -> Self {
        Self::new(TypeKind::Formula(FormulaType::new(items)))
    }

    pub fn sequence(item: Type, separator: Option<String>) -> Self {
        Self::new(TypeKind::Sequence(SequenceType::new(item, separator)))
    }

    pub fn list(item: Type) -> Self {
        Self::new(TypeKind::List(ListType::new(item)))
    }

    pub fn map(key: Type, value: Type) -> Self {
        Self::new(TypeKind::Map(MapType::new(key, value)))
    }

    pub fn structure(children: IndexMap<String, Type>) -> Self {
        Self::new(TypeKind::Struct(StructType::new(children)))
    }

    pub fn oneof(type_key: Option<String>, options: Vec<OneofOption>) -> Self {
        Self::new(TypeKind::Oneof(OneofType::new(type_key, options)))
    }

    pub fn complex(
        text: Type,
        text_key: impl Into<String>,
        structure: Type,
        struct_key: impl Into<String>,
    ) -> Self {
        Self::new(TypeKind::Complex(ComplexType::new(
            text,
            text_key.into(),
            structure,
            struct_key.into(),
        )))
    }

    /// An unpatched delegated placeholder.
    pub fn delegated() -> Self {
        Self::new(TypeKind::Delegated(RefCell::new(None)))
    }

    /// Point a delegated placeholder at its concrete target.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a delegated placeholder or is already patched;
    /// both indicate a resolver bug.
    pub fn patch_delegated(&self, target: Type) {
        match self.kind() {
            TypeKind::Delegated(slot) => {
                let mut slot = slot.borrow_mut();
                assert!(slot.is_none(), "delegated target patched twice");
                *slot = Some(target);
            }
            _ => panic!("patch_delegated on a concrete type"),
        }
    }

    /// Follow delegated indirections to the concrete type. An unpatched
    /// placeholder resolves to itself.
    pub fn resolved(&self) -> Type {
        match self.kind() {
            TypeKind::Delegated(slot) => match &*slot.borrow() {
                Some(target) => target.resolved(),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    fn delegated_target(&self, at: Pos) -> Result<Type> {
        match self.kind() {
            TypeKind::Delegated(slot) => slot.borrow().clone().ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::CircularUnresolved,
                    at,
                    "delegated type used before resolution",
                )
            }),
            _ => unreachable!("delegated_target on a concrete type"),
        }
    }

    // -- operation suite ---------------------------------------------------

    /// Parse a line value into the node addressed by `builder`.
    pub fn parse(&self, builder: &Builder, text: &str, at: Pos) -> Result<()> {
        match self.kind() {
            TypeKind::Str(t) => t.parse(builder, text),
            TypeKind::Constant(t) => t.parse(builder, text),
            TypeKind::Int(t) => t.parse(builder, text, at),
            TypeKind::Number(t) => t.parse(builder, text, at),
            TypeKind::Bool(t) => t.parse(builder, text, at),
            TypeKind::Enum(t) => t.parse(builder, text, at),
            TypeKind::Formula(t) => t.parse(builder, text, at),
            TypeKind::Sequence(t) => t.parse(builder, text, at),
            TypeKind::List(_) | TypeKind::Map(_) => Ok(()),
            TypeKind::Struct(t) => t.parse(text, at),
            TypeKind::Oneof(t) => t.parse(builder, text, at),
            TypeKind::Complex(t) => t.parse(builder, text, at),
            TypeKind::Delegated(_) => self.delegated_target(at)?.parse(builder, text, at),
        }
    }

    /// Parse an indented child line of this node. Returns the node the child
    /// produced, which becomes the parent at the next indent level.
    pub fn parse_child(&self, builder: &Builder, line: &str, at: Pos) -> Result<NodeInfo> {
        match self.kind() {
            TypeKind::Str(t) => t.parse_child(self, builder, line),
            TypeKind::List(t) => t.parse_child(builder, line, at),
            TypeKind::Map(t) => t.parse_child(builder, line, at),
            TypeKind::Struct(t) => t.parse_child(builder, line, at),
            TypeKind::Oneof(t) => t.parse_child(builder, line, at),
            TypeKind::Formula(t) => t.parse_child(builder, line, at),
            TypeKind::Complex(t) => t.parse_child(builder, line, at),
            TypeKind::Delegated(_) => self.delegated_target(at)?.parse_child(builder, line, at),
            _ => Err(self.not_supported("children", at)),
        }
    }

    /// Resolve a named child for dotted-path navigation, threading the
    /// builder to the child's node.
    pub fn get_child(&self, name: &str, builder: &Builder, at: Pos) -> Result<(Type, Builder)> {
        match self.kind() {
            TypeKind::Map(t) => Ok(t.get_child(name, builder)),
            TypeKind::Struct(t) => t.get_child(name, builder, at),
            TypeKind::Complex(t) => t.get_child(name, builder, at),
            TypeKind::Delegated(_) => self.delegated_target(at)?.get_child(name, builder, at),
            _ => Err(self.not_supported(&format!("child lookup for '{}'", name), at)),
        }
    }

    /// Regex fragment matching this type's line form, for composition into
    /// enclosing formula / sequence / oneof patterns. Re-entering the same
    /// node through `ctx` bottoms out at a non-greedy wildcard, so cyclic
    /// type graphs generate finite patterns.
    pub fn to_regex(&self, ctx: &RegexCtx) -> String {
        match self.kind() {
            TypeKind::Str(t) => t.to_regex(),
            TypeKind::Constant(t) => t.to_regex(),
            TypeKind::Int(t) => t.to_regex(),
            TypeKind::Number(t) => t.to_regex(),
            TypeKind::Bool(t) => t.to_regex(),
            TypeKind::Enum(t) => t.to_regex(),
            TypeKind::List(_) | TypeKind::Struct(_) => String::new(),
            TypeKind::Formula(t) => match ctx.with(self) {
                Some(inner) => t.to_regex(&inner),
                None => RegexCtx::CUTOFF.to_string(),
            },
            TypeKind::Sequence(t) => match ctx.with(self) {
                Some(inner) => t.to_regex(&inner),
                None => RegexCtx::CUTOFF.to_string(),
            },
            TypeKind::Map(t) => match ctx.with(self) {
                Some(inner) => t.to_regex(&inner),
                None => RegexCtx::CUTOFF.to_string(),
            },
            TypeKind::Oneof(t) => match ctx.with(self) {
                Some(inner) => t.to_regex(&inner),
                None => RegexCtx::CUTOFF.to_string(),
            },
            TypeKind::Complex(t) => match ctx.with(self) {
                Some(inner) => t.to_regex(&inner),
                None => RegexCtx::CUTOFF.to_string(),
            },
            TypeKind::Delegated(slot) => match &*slot.borrow() {
                Some(target) => target.to_regex(ctx),
                None => RegexCtx::CUTOFF.to_string(),
            },
        }
    }

    /// Whether indented children may appear under a node of this type.
    pub fn supports_children(&self) -> bool {
        match self.kind() {
            TypeKind::Map(_) | TypeKind::Struct(_) => true,
            TypeKind::Oneof(t) => t.supports_children(),
            TypeKind::Complex(t) => t.supports_children(),
            TypeKind::Delegated(slot) => match &*slot.borrow() {
                Some(target) => target.supports_children(),
                None => false,
            },
            _ => false,
        }
    }

    /// Whether this type produces a single scalar value (oneof wraps such
    /// options under a `value` field).
    pub fn is_simple(&self) -> bool {
        match self.kind() {
            TypeKind::Str(_)
            | TypeKind::Constant(_)
            | TypeKind::Int(_)
            | TypeKind::Number(_)
            | TypeKind::Bool(_)
            | TypeKind::Enum(_) => true,
            TypeKind::Delegated(slot) => match &*slot.borrow() {
                Some(target) => target.is_simple(),
                None => false,
            },
            _ => false,
        }
    }

    fn not_supported(&self, what: &str, at: Pos) -> ParseError {
        ParseError::new(
            ParseErrorKind::NotSupported,
            at,
            format!("{} not supported by this value type", what),
        )
    }
}

/// Tracks which type nodes the current regex expansion has already passed
/// through. Re-entering a node yields `None` from [`RegexCtx::with`]; the
/// caller emits [`RegexCtx::CUTOFF`] instead of recursing.
pub struct RegexCtx {
    usage: HashMap<usize, u32>,
}

impl RegexCtx {
    /// Pattern emitted where a cycle is cut.
    pub const CUTOFF: &'static str = ".*?";

    pub fn new() -> Self {
        Self {
            usage: HashMap::new(),
        }
    }

    /// Context for descending into `ty`'s children, or `None` when `ty` was
    /// already visited on this path.
    fn with(&self, ty: &Type) -> Option<RegexCtx> {
        let id = ty.id();
        if self.usage.get(&id).copied().unwrap_or(0) > 0 {
            return None;
        }
        let mut usage = self.usage.clone();
        *usage.entry(id).or_insert(0) += 1;
        Some(RegexCtx { usage })
    }
}

impl Default for RegexCtx {
    fn default() -> Self {
        Self::new()
    }
}
