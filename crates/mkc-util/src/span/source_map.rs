//! Source map - file registry for multi-file compilation.
//!
//! The driver adds every loaded file to a [`SourceMap`] and threads the
//! resulting [`FileId`] through lexing and parsing, so diagnostics can
//! render `name:line:col` without the phases holding on to file names.

use super::FileId;

/// A single registered source file.
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// Display name (usually the path the driver read it from)
    pub name: String,
    /// Full file contents
    pub src: String,
}

/// Registry of all source files in one compiler invocation.
///
/// # Examples
///
/// ```
/// use mkc_util::span::SourceMap;
///
/// let mut map = SourceMap::new();
/// let id = map.add_file("main.mk", "fn main() -> Int { 0 }");
/// assert_eq!(map.name(id), "main.mk");
/// ```
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Register a file and return its id.
    pub fn add_file(&mut self, name: impl Into<String>, src: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            name: name.into(),
            src: src.into(),
        });
        id
    }

    /// Display name for a file id.
    ///
    /// Unknown ids (including [`FileId::DUMMY`] when no file was added)
    /// render as `<unknown>` rather than panicking, since diagnostics must
    /// never abort the compiler.
    pub fn name(&self, id: FileId) -> &str {
        self.files.get(id.0).map_or("<unknown>", |f| f.name.as_str())
    }

    /// Contents of a file, if registered.
    pub fn source(&self, id: FileId) -> Option<&str> {
        self.files.get(id.0).map(|f| f.src.as_str())
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_assigns_sequential_ids() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.mk", "module a {}");
        let b = map.add_file("b.mk", "module b {}");
        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn name_and_source_round_trip() {
        let mut map = SourceMap::new();
        let id = map.add_file("x.mk", "fn f() -> Int { 1 }");
        assert_eq!(map.name(id), "x.mk");
        assert_eq!(map.source(id), Some("fn f() -> Int { 1 }"));
    }

    #[test]
    fn unknown_id_renders_placeholder() {
        let map = SourceMap::new();
        assert_eq!(map.name(FileId(7)), "<unknown>");
        assert!(map.source(FileId(7)).is_none());
    }
}
