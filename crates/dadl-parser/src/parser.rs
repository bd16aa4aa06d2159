//! Line-oriented, schema-directed parser driver.
//!
//! The driver walks physical lines and keeps one parse frame per indentation
//! weight. Each data line is handed to the value type of the frame's parent
//! node, which consumes it and returns the node the line produced; deeper
//! indentation descends into that node, shallower indentation re-activates
//! the nearest stored frame at or below the new weight.
//!
//! Group headers (`[dotted.path]`, `[dotted.path < glob]`) retarget the root
//! frame, and the `@schema` magic directive activates a schema when none is
//! set. Everything else is a comment, a blank, or a data line.

use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::trace;

use crate::builder::Builder;
use crate::error::{ParseError, ParseErrorKind, Pos, Result};
use crate::resources::{resource_stem, ResourceProvider};
use crate::schema::{parse_schema, Schema};
use crate::types::{NodeInfo, TypeKind};
use crate::value::Value;

static GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^\\[(?P<treePath>[a-zA-Z0-9._$-]*)\\s*(?:<\\s*(?P<importPath>.+))?\\]$").unwrap()
});

/// DADL parser.
#[derive(Debug, Default)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a document into a tree. The root container kind is decided by
    /// the document; an empty document yields an empty map.
    pub fn parse<R: Read>(&self, reader: R, resources: &dyn ResourceProvider) -> Result<Value> {
        let builder = Builder::new_root();
        self.parse_with(reader, resources, &builder, None)?;
        match builder.into_value() {
            Value::Null => Ok(Value::Map(IndexMap::new())),
            tree => Ok(tree),
        }
    }

    /// Parse a document into an existing builder, optionally under an
    /// already-active schema. Used recursively for imports.
    pub fn parse_with<R: Read>(
        &self,
        reader: R,
        resources: &dyn ResourceProvider,
        builder: &Builder,
        schema: Option<Schema>,
    ) -> Result<()> {
        let mut driver = Driver::new(resources, builder.clone(), schema);
        for line in BufReader::new(reader).lines() {
            let line = line.map_err(|e| ParseError::io("<input>", e))?;
            driver.process_line(line.trim_end())?;
        }
        Ok(())
    }
}

/// Parse state for one indentation weight.
struct Frame {
    indent: usize,
    parent: Option<NodeInfo>,
    last: Option<NodeInfo>,
}

struct Driver<'a> {
    resources: &'a dyn ResourceProvider,
    root_builder: Builder,
    schema: Option<Schema>,
    /// Frames indexed by indent weight for O(1) dedent lookup.
    frames: Vec<Option<Frame>>,
    current: usize,
    line_no: usize,
}

impl<'a> Driver<'a> {
    fn new(
        resources: &'a dyn ResourceProvider,
        root_builder: Builder,
        schema: Option<Schema>,
    ) -> Self {
        let parent = schema.as_ref().map(|s| s.root_node(&root_builder));
        Self {
            resources,
            root_builder,
            schema,
            frames: vec![Some(Frame {
                indent: 0,
                parent,
                last: None,
            })],
            current: 0,
            line_no: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        let at = Pos::new(self.line_no, 0);

        if line.starts_with('[') && line.ends_with(']') {
            trace!(line, "group header");
            self.process_group(line, at)
        } else if line.trim().is_empty() {
            Ok(())
        } else if line.starts_with('#') {
            trace!(line, "comment");
            Ok(())
        } else if line.starts_with('@') {
            self.process_magic(line, at)
        } else {
            self.process_data(line, at)
        }
    }

    fn process_data(&mut self, line: &str, at: Pos) -> Result<()> {
        let indent = leading_whitespace_width(line);
        let current_indent = self.frame().indent;

        if indent > current_indent {
            let parent = self.frame().last.clone();
            if parent.is_none() {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedChild,
                    at,
                    "unexpected indentation",
                ));
            }
            if self.frames.len() <= indent {
                self.frames.resize_with(indent + 1, || None);
            }
            self.frames[indent] = Some(Frame {
                indent,
                parent,
                last: None,
            });
            self.current = indent;
        } else if indent < current_indent {
            // nearest stored frame at or below the new weight
            for weight in (0..=indent).rev() {
                if self.frames[weight].is_some() {
                    self.current = weight;
                    break;
                }
            }
        }

        let parent = self.frame().parent.clone().ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingSchema, at, "missing schema info")
        })?;
        trace!(line, indent, "data line");
        let produced = parent.ty.parse_child(&parent.builder, line, at)?;
        self.frames[self.current]
            .as_mut()
            .expect("current frame always present")
            .last = Some(produced);
        Ok(())
    }

    fn process_group(&mut self, line: &str, at: Pos) -> Result<()> {
        let caps = GROUP_RE.captures(line).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::InvalidGroupHeader,
                at,
                format!("invalid group definition: {}", line),
            )
        })?;
        let tree_path = caps.name("treePath").map(|m| m.as_str()).unwrap_or("");
        let import_path = caps.name("importPath").map(|m| m.as_str());

        let schema = self.schema.clone().ok_or_else(|| {
            ParseError::new(ParseErrorKind::MissingSchema, at, "missing schema info")
        })?;

        let frame = match import_path {
            Some(pattern) => self.process_import(&schema, tree_path, pattern, at)?,
            None => {
                let (ty, builder) = schema.get_node(tree_path, &self.root_builder, at)?;
                ty.parse(&builder, "", at)?;
                Frame {
                    indent: 0,
                    parent: Some(NodeInfo::new(ty, builder)),
                    last: None,
                }
            }
        };

        self.frames.clear();
        self.frames.push(Some(frame));
        self.current = 0;
        Ok(())
    }

    /// Splice external resources into the tree. A trailing `._` path segment
    /// gives every matched file its own subtree named after the file stem;
    /// string-typed targets receive the file verbatim, everything else is
    /// parsed recursively with a schema rooted at the target type.
    fn process_import(
        &mut self,
        schema: &Schema,
        tree_path: &str,
        pattern: &str,
        at: Pos,
    ) -> Result<Frame> {
        let paths = self.resources.find_resources(pattern)?;
        if paths.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::ImportNoMatch,
                at,
                format!("no file matches given path: {}", pattern),
            ));
        }

        let mut imported: Option<NodeInfo> = None;
        for path in &paths {
            let target_path = if tree_path.ends_with("._") {
                format!(
                    "{}{}",
                    &tree_path[..tree_path.len() - 1],
                    resource_stem(path)
                )
            } else {
                tree_path.to_string()
            };

            trace!(resource = %path, target = %target_path, "import");
            let (ty, builder) = schema.get_node(&target_path, &self.root_builder, at)?;
            let reader = self.resources.get_resource(path)?;

            if matches!(ty.resolved().kind(), TypeKind::Str(_)) {
                let mut text = String::new();
                BufReader::new(reader)
                    .read_to_string(&mut text)
                    .map_err(|e| ParseError::io(path, e))?;
                builder.set_simple(Value::String(text));
            } else {
                let nested = self.resources.for_resource(path);
                Parser::new().parse_with(
                    reader,
                    nested.as_ref(),
                    &builder,
                    Some(Schema::new(ty.clone())),
                )?;
            }
            imported = Some(NodeInfo::new(ty, builder));
        }

        Ok(Frame {
            indent: 0,
            parent: imported,
            last: None,
        })
    }

    fn process_magic(&mut self, line: &str, at: Pos) -> Result<()> {
        let Some(rest) = line.strip_prefix("@schema ") else {
            return Err(ParseError::new(
                ParseErrorKind::UnknownMagic,
                at,
                format!("unknown magic line: {}", line),
            ));
        };

        if self.schema.is_some() {
            // the host's schema wins; later assertions are ignored
            return Ok(());
        }

        let mut parts = rest.split(' ');
        let name = parts.next().unwrap_or("");
        let loaded = parse_schema(name, self.resources)?;

        let parent = match parts.next() {
            Some(path) if path.starts_with('[') && path.ends_with(']') => {
                // restrict the effective root to a subtree of the schema
                let throwaway = Builder::new_root();
                let (ty, _) = loaded.get_node(&path[1..path.len() - 1], &throwaway, at)?;
                self.schema = Some(Schema::new(ty.clone()));
                NodeInfo::new(ty, self.root_builder.clone())
            }
            _ => {
                let parent = loaded.root_node(&self.root_builder);
                self.schema = Some(loaded);
                parent
            }
        };

        self.frames[self.current]
            .as_mut()
            .expect("current frame always present")
            .parent = Some(parent);
        Ok(())
    }

    fn frame(&self) -> &Frame {
        self.frames[self.current]
            .as_ref()
            .expect("current frame always present")
    }
}

/// Indent weight: the count of leading whitespace code points.
pub(crate) fn leading_whitespace_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
