//! Schema handle and schema loading.

use crate::builder::Builder;
use crate::error::{Pos, Result};
use crate::meta::meta_schema;
use crate::parser::Parser;
use crate::resolver::build_schema;
use crate::resources::ResourceProvider;
use crate::schema_ast;
use crate::types::{NodeInfo, Type};

/// A loaded schema: the root of a type tree plus dotted-path resolution
/// into it.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Type,
}

impl Schema {
    pub fn new(root: Type) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Type {
        &self.root
    }

    /// Root node info over the given builder.
    pub(crate) fn root_node(&self, builder: &Builder) -> NodeInfo {
        NodeInfo::new(self.root.clone(), builder.clone())
    }

    /// Resolve a dotted path, threading the builder through each segment so
    /// the returned builder addresses the path's node in the output tree.
    pub fn get_node(&self, path: &str, builder: &Builder, at: Pos) -> Result<(Type, Builder)> {
        let mut ty = self.root.clone();
        let mut cursor = builder.clone();
        for segment in path.split('.') {
            let (next_ty, next_cursor) = ty.get_child(segment, &cursor, at)?;
            ty = next_ty;
            cursor = next_cursor;
        }
        Ok((ty, cursor))
    }
}

/// Load a schema by name: the built-in meta-schema for `dadl`, otherwise a
/// schema file resolved through the resource provider.
///
/// Schema files open with `@schema dadl`, so a plain parse yields the
/// definition tree; it is then decoded into the schema AST and resolved into
/// live types.
pub fn parse_schema(name: &str, resources: &dyn ResourceProvider) -> Result<Schema> {
    if name == "dadl" {
        return Ok(meta_schema());
    }

    tracing::debug!(schema = name, "loading schema file");
    let reader = resources.get_resource(name)?;
    let tree = Parser::new().parse(reader, resources)?;
    let ast = schema_ast::decode(&tree)?;
    build_schema(&ast)
}
