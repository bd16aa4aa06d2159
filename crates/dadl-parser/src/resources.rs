//! Resource access for imports and schema files.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ParseError, ParseErrorKind, Result};

/// Provides the resources a document references: its schema file and the
/// files pulled in by `[path < glob]` imports.
///
/// Paths handed to and returned from a provider are relative to the
/// provider's base; `for_resource` derives a provider rooted at a resource's
/// directory so that nested imports resolve relative to the file that
/// declared them.
pub trait ResourceProvider {
    /// Open a resource for reading.
    fn get_resource(&self, path: &str) -> Result<Box<dyn Read>>;

    /// Expand a glob pattern to the matching resource paths, relative to the
    /// provider base. Order is deterministic.
    fn find_resources(&self, pattern: &str) -> Result<Vec<String>>;

    /// A provider rooted at the given resource's directory.
    fn for_resource(&self, path: &str) -> Box<dyn ResourceProvider>;
}

/// Filesystem-backed provider rooted at a base directory.
pub struct FsResourceProvider {
    base: PathBuf,
}

impl FsResourceProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ResourceProvider for FsResourceProvider {
    fn get_resource(&self, path: &str) -> Result<Box<dyn Read>> {
        let full = self.base.join(path);
        let file = File::open(&full).map_err(|e| ParseError::io(full.display(), e))?;
        Ok(Box::new(file))
    }

    fn find_resources(&self, pattern: &str) -> Result<Vec<String>> {
        let full_pattern = self.base.join(pattern);
        let full_pattern = full_pattern.to_string_lossy();
        let walker = glob::glob(&full_pattern).map_err(|e| {
            ParseError::unpositioned(
                ParseErrorKind::ImportNoMatch,
                format!("invalid import pattern {}: {}", pattern, e),
            )
        })?;

        let mut found = Vec::new();
        for entry in walker {
            let path = entry.map_err(|e| ParseError::io(e.path().display().to_string(), e.into_error()))?;
            let relative = path.strip_prefix(&self.base).unwrap_or(&path);
            found.push(relative.to_string_lossy().into_owned());
        }
        found.sort();
        Ok(found)
    }

    fn for_resource(&self, path: &str) -> Box<dyn ResourceProvider> {
        let dir = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
        Box::new(FsResourceProvider::new(self.base.join(dir)))
    }
}

/// Stem of a resource path: file name without its last extension. Used by
/// `[target._ < glob]` imports to name each file's subtree.
pub fn resource_stem(path: &str) -> &str {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn stem_strips_last_extension_only() {
        assert_eq!(resource_stem("modules/cart.dad"), "cart");
        assert_eq!(resource_stem("a/b/archive.tar.gz"), "archive.tar");
        assert_eq!(resource_stem("noext"), "noext");
        assert_eq!(resource_stem(".hidden"), ".hidden");
    }

    #[test]
    fn find_resources_returns_sorted_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("modules")).unwrap();
        fs::write(dir.path().join("modules/b.dad"), "x").unwrap();
        fs::write(dir.path().join("modules/a.dad"), "x").unwrap();
        fs::write(dir.path().join("modules/skip.txt"), "x").unwrap();

        let provider = FsResourceProvider::new(dir.path());
        let found = provider.find_resources("modules/*.dad").unwrap();
        assert_eq!(found, vec!["modules/a.dad", "modules/b.dad"]);
    }

    #[test]
    fn for_resource_reroots_at_the_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("modules")).unwrap();
        fs::write(dir.path().join("modules/inner.dad"), "payload").unwrap();

        let provider = FsResourceProvider::new(dir.path());
        let nested = provider.for_resource("modules/inner.dad");
        let mut text = String::new();
        nested
            .get_resource("inner.dad")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "payload");
    }
}
