//! Source loading for `#include` and the line stream that splices included
//! sources into the main one.

use std::io;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};

use super::ast::LineInfo;
use super::error::CompileError;
use super::lexer::Lexer;

/// Supplies the text of included sources by name.
pub trait SourceLoader {
    fn load(&self, name: &str) -> io::Result<String>;
}

/// Rejects every include.
pub struct NoIncludes;

impl SourceLoader for NoIncludes {
    fn load(&self, _name: &str) -> io::Result<String> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "includes are disabled"))
    }
}

/// In-memory sources keyed by include name.
impl SourceLoader for IndexMap<String, String> {
    fn load(&self, name: &str) -> io::Result<String> {
        self.get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no source named '{name}'")))
    }
}

/// Looks up includes in an ordered list of directories.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    search_dirs: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Search the directory of `file` first, then `extra`.
    pub fn for_file(file: &Path, extra: &[PathBuf]) -> Self {
        let mut search_dirs = Vec::with_capacity(extra.len() + 1);
        if let Some(parent) = file.parent() {
            search_dirs.push(parent.to_path_buf());
        }
        search_dirs.extend(extra.iter().cloned());
        Self { search_dirs }
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, name: &str) -> io::Result<String> {
        let found = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file());
        match found {
            // read_to_string opens and closes the file within the call
            Some(path) => std::fs::read_to_string(path),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{name}' not found in {} search directories", self.search_dirs.len()),
            )),
        }
    }
}

// ── Line stream ──────────────────────────────────────────────────

struct Frame {
    name: Option<String>,
    lexer: Lexer,
}

/// Logical lines from the main source with included sources spliced in at
/// the point of their `#include` line.
pub struct LineStream<'a> {
    frames: Vec<Frame>,
    loader: &'a dyn SourceLoader,
    included: IndexSet<String>,
    max_depth: usize,
    last_line: usize,
}

impl<'a> LineStream<'a> {
    pub fn new(source: &str, loader: &'a dyn SourceLoader, max_depth: usize) -> Self {
        Self {
            frames: vec![Frame {
                name: None,
                lexer: Lexer::new(source),
            }],
            loader,
            included: IndexSet::new(),
            max_depth,
            last_line: 1,
        }
    }

    /// Line number of the most recent line handed out.
    pub fn last_line(&self) -> usize {
        self.last_line
    }

    pub fn next_line(&mut self) -> Result<Option<LineInfo>, CompileError> {
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Ok(None);
            };
            let next = match frame.lexer.next_line() {
                Ok(next) => next,
                Err(mut err) => {
                    if let Some(name) = &frame.name {
                        err.message = format!("{} (in '{name}')", err.message);
                    }
                    return Err(err);
                }
            };
            match next {
                Some(line) => {
                    self.last_line = line.line;
                    return Ok(Some(line));
                }
                None if self.frames.len() > 1 => {
                    if let Some(done) = self.frames.pop() {
                        tracing::debug!(source = done.name.as_deref().unwrap_or_default(), "finished include");
                    }
                }
                None => return Ok(None),
            }
        }
    }

    /// Splice `name` in at the current position. Returns `false` when an
    /// `#include_once` names a source that was already included.
    pub fn include(&mut self, name: &str, once: bool, line: usize) -> Result<bool, CompileError> {
        if once && self.included.contains(name) {
            tracing::debug!(source = name, "skipping repeated include");
            return Ok(false);
        }
        if self.frames.len() > self.max_depth {
            return Err(CompileError::declaration(
                format!("Include depth limit of {} exceeded by '{name}'", self.max_depth),
                line,
            ));
        }
        let text = self.loader.load(name).map_err(|err| {
            let mut err = CompileError::io(name, &err);
            err.line = line;
            err
        })?;
        tracing::debug!(source = name, bytes = text.len(), "including source");
        self.included.insert(name.to_owned());
        self.frames.push(Frame {
            name: Some(name.to_owned()),
            lexer: Lexer::new(&text),
        });
        Ok(true)
    }

    pub fn included(&self) -> impl Iterator<Item = &str> {
        self.included.iter().map(String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;

    fn texts(line: &LineInfo) -> Vec<&str> {
        line.texts()
    }

    fn loader(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn include_is_spliced_in_place() {
        let sources = loader(&[("lib.lsl", "integer b;")]);
        let mut stream = LineStream::new("integer a;\ninteger c;", &sources, 4);
        assert_eq!(texts(&stream.next_line().unwrap().unwrap()), vec!["integer", "a", ";"]);
        assert!(stream.include("lib.lsl", false, 1).unwrap());
        assert_eq!(texts(&stream.next_line().unwrap().unwrap()), vec!["integer", "b", ";"]);
        assert_eq!(texts(&stream.next_line().unwrap().unwrap()), vec!["integer", "c", ";"]);
        assert!(stream.next_line().unwrap().is_none());
    }

    #[test]
    fn include_once_skips_repeats() {
        let sources = loader(&[("lib.lsl", "integer b;")]);
        let mut stream = LineStream::new("", &sources, 4);
        assert!(stream.include("lib.lsl", true, 1).unwrap());
        assert!(!stream.include("lib.lsl", true, 2).unwrap());
        assert_eq!(stream.included().collect::<Vec<_>>(), vec!["lib.lsl"]);
    }

    #[test]
    fn depth_limit() {
        let sources = loader(&[("a", ""), ("b", "")]);
        let mut stream = LineStream::new("", &sources, 1);
        stream.include("a", false, 1).unwrap();
        let err = stream.include("b", false, 1).unwrap_err();
        assert!(err.message.contains("depth limit"));
    }

    #[test]
    fn missing_include_is_io_error() {
        let mut stream = LineStream::new("", &NoIncludes, 4);
        let err = stream.include("x.lsl", false, 7).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.line, 7);
    }

    #[test]
    fn lexer_errors_name_the_include() {
        let sources = loader(&[("bad.lsl", "string s = \"open")]);
        let mut stream = LineStream::new("", &sources, 4);
        stream.include("bad.lsl", false, 1).unwrap();
        let err = stream.next_line().unwrap_err();
        assert!(err.message.contains("(in 'bad.lsl')"));
    }

    #[test]
    fn fs_loader_searches_directories_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("util.lsl"), "integer u;").unwrap();
        let fs = FsLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(fs.load("util.lsl").unwrap(), "integer u;");
        assert_eq!(fs.load("missing.lsl").unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
