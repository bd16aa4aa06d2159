//! # DADL parser
//!
//! Schema-directed parser for DADL, an indentation-sensitive configuration
//! language whose per-position grammar is supplied by a user-defined schema,
//! itself a DADL file parsed with the built-in meta-schema.
//!
//! ## Architecture
//!
//! - `value`: the output tree (ordered maps, lists, scalars)
//! - `builder`: write cursors value types use to grow the tree
//! - `types`: the closed set of value types with a uniform operation suite
//! - `schema` / `schema_ast` / `resolver` / `meta`: schema loading (parse,
//!   decode to the schema AST, resolve to live types; cycles tolerated via a
//!   delegated indirection)
//! - `parser`: the line driver (indent tracking, group headers, `@schema`
//!   magic, imports)
//! - `resources`: file/glob access for imports and schema files
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dadl_parser::{FsResourceProvider, Parser};
//!
//! let file = std::fs::File::open("config.dad")?;
//! let resources = FsResourceProvider::new("." );
//! let tree = Parser::new().parse(file, &resources)?;
//! ```

pub mod builder;
pub mod error;
mod meta;
pub mod parser;
pub mod resolver;
pub mod resources;
pub mod schema;
pub mod schema_ast;
pub mod types;
pub mod value;

pub use builder::Builder;
pub use error::{ParseError, ParseErrorKind, Result};
pub use parser::Parser;
pub use resources::{FsResourceProvider, ResourceProvider};
pub use schema::{parse_schema, Schema};
pub use value::Value;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
